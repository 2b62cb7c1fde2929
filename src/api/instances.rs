//! Book instance (physical copy) endpoints, including the renewal workflow

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::instance::{
        BookInstance, CreateInstance, InstanceQuery, LoanStatus, UpdateInstance,
    },
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// A borrowed copy as shown in "my borrowed" listings
#[derive(Serialize, ToSchema)]
pub struct BorrowedInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: Option<String>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

impl BorrowedInstance {
    fn from_instance(instance: BookInstance, today: NaiveDate) -> Self {
        let is_overdue = instance.is_overdue(today);
        Self {
            id: instance.id,
            book_id: instance.book_id,
            book_title: instance.book_title,
            imprint: instance.imprint,
            due_back: instance.due_back,
            status: instance.status,
            is_overdue,
        }
    }
}

/// Renewal form state: the instance and the pre-filled proposal
#[derive(Serialize, ToSchema)]
pub struct RenewalProposalResponse {
    pub instance: BookInstance,
    /// Default proposal: three weeks from today
    pub proposed_due_back: NaiveDate,
}

/// Renewal submission
#[derive(Deserialize, ToSchema)]
pub struct RenewRequest {
    /// New due date; must lie between today and four weeks out (inclusive)
    pub due_back: NaiveDate,
}

/// Pagination for "my borrowed" listings
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MyLoansQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// List instances with pagination, optionally filtered by status code
#[utoipa::path(
    get,
    path = "/instances",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status code (m, o, a, r)"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Instances per page (default: 10)")
    ),
    responses(
        (status = 200, description = "List of instances", body = PaginatedResponse<BookInstance>),
        (status = 400, description = "Unknown status code")
    )
)]
pub async fn list_instances(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<InstanceQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    claims.require_manage_catalog()?;

    let (instances, total) = state.services.catalog.list_instances(&query).await?;

    Ok(Json(PaginatedResponse {
        items: instances,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Get instance details by UUID
#[utoipa::path(
    get,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Instance UUID")
    ),
    responses(
        (status = 200, description = "Instance details", body = BookInstance),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.catalog.get_instance(id).await?;
    Ok(Json(instance))
}

/// Create a new instance (status defaults to maintenance)
#[utoipa::path(
    post,
    path = "/instances",
    tag = "instances",
    security(("bearer_auth" = [])),
    request_body = CreateInstance,
    responses(
        (status = 201, description = "Instance created", body = BookInstance),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(instance): Json<CreateInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_manage_catalog()?;

    let created = state.services.catalog.create_instance(instance).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an instance. Status writes are permissive: any of the four
/// states may be set by an authorized writer.
#[utoipa::path(
    put,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Instance UUID")
    ),
    request_body = UpdateInstance,
    responses(
        (status = 200, description = "Instance updated", body = BookInstance),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn update_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(instance): Json<UpdateInstance>,
) -> AppResult<Json<BookInstance>> {
    claims.require_manage_catalog()?;

    let updated = state.services.catalog.update_instance(id, instance).await?;
    Ok(Json(updated))
}

/// Delete an instance
#[utoipa::path(
    delete,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Instance UUID")
    ),
    responses(
        (status = 204, description = "Instance deleted"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_manage_catalog()?;

    state.services.catalog.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Renewal form state: instance details and the default proposal
/// (three weeks from today).
#[utoipa::path(
    get,
    path = "/instances/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Instance UUID")
    ),
    responses(
        (status = 200, description = "Renewal proposal", body = RenewalProposalResponse),
        (status = 403, description = "Missing renewal permission"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn renewal_proposal(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalProposalResponse>> {
    claims.require_mark_returned()?;

    let today = Utc::now().date_naive();
    let (instance, proposed_due_back) = state
        .services
        .circulation
        .renewal_proposal(id, today)
        .await?;

    Ok(Json(RenewalProposalResponse {
        instance,
        proposed_due_back,
    }))
}

/// Renew a loan. On success responds with the caller's refreshed
/// "currently borrowed" listing, the page a successful renewal lands on.
#[utoipa::path(
    post,
    path = "/instances/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Instance UUID")
    ),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Loan renewed; caller's borrowed listing", body = PaginatedResponse<BorrowedInstance>),
        (status = 400, description = "Proposed date outside the allowed window"),
        (status = 403, description = "Missing renewal permission"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn renew_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewRequest>,
) -> AppResult<Json<PaginatedResponse<BorrowedInstance>>> {
    claims.require_mark_returned()?;

    let today = Utc::now().date_naive();
    state
        .services
        .circulation
        .renew(id, request.due_back, today)
        .await?;

    let (instances, total) = state
        .services
        .circulation
        .borrowed_by(claims.user_id, 1, 10)
        .await?;

    Ok(Json(PaginatedResponse {
        items: instances
            .into_iter()
            .map(|i| BorrowedInstance::from_instance(i, today))
            .collect(),
        total,
        page: 1,
        per_page: 10,
    }))
}

/// Copies currently on loan to the caller, due soonest first.
/// A caller with nothing on loan gets an empty list.
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Copies per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Caller's on-loan copies", body = PaginatedResponse<BorrowedInstance>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MyLoansQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedInstance>>> {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(10);
    let today = Utc::now().date_naive();

    let (instances, total) = state
        .services
        .circulation
        .borrowed_by(claims.user_id, page, per_page)
        .await?;

    Ok(Json(PaginatedResponse {
        items: instances
            .into_iter()
            .map(|i| BorrowedInstance::from_instance(i, today))
            .collect(),
        total,
        page,
        per_page,
    }))
}
