//! Home page endpoint: catalog summary and the session visit counter

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;

/// Name of the session cookie carrying the visit-counter key
const SESSION_COOKIE: &str = "openshelf_session";

/// Catalog-wide counts shown on the home page
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
}

/// Home page response
#[derive(Serialize, ToSchema)]
pub struct HomeResponse {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    /// Visits in this session, including this one
    pub num_visits: i64,
}

/// Home page: catalog counts plus the per-session visit counter.
/// Issues the session cookie on first visit.
#[utoipa::path(
    get,
    path = "/",
    tag = "home",
    responses(
        (status = 200, description = "Catalog summary", body = HomeResponse)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<HomeResponse>)> {
    let (session_id, jar) = match jar.get(SESSION_COOKIE) {
        Some(cookie) => (cookie.value().to_string(), jar),
        None => {
            let session_id = Uuid::new_v4().to_string();
            let cookie = Cookie::build((SESSION_COOKIE, session_id.clone()))
                .path("/")
                .http_only(true)
                .build();
            (session_id, jar.add(cookie))
        }
    };

    let num_visits = state.services.sessions.record_visit(&session_id).await?;
    let counts = state.services.catalog.counts().await?;

    Ok((
        jar,
        Json(HomeResponse {
            num_books: counts.num_books,
            num_instances: counts.num_instances,
            num_instances_available: counts.num_instances_available,
            num_authors: counts.num_authors,
            num_visits,
        }),
    ))
}
