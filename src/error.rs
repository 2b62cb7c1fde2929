//! Error types for the OpenShelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed in error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    NoSuchAuthor = 6,
    NoSuchGenre = 7,
    NoSuchInstance = 8,
    Duplicate = 9,
    BadValue = 10,
    BookHasInstances = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Validation failure attributable to a single form field
    #[error("Validation error on {field}: {message}")]
    FieldValidation { field: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Field-level validation error (renewal dates and the like)
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::FieldValidation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Set when the failure is attributable to a single request field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone(), None)
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone(), None)
            }
            AppError::NotFound(msg) => {
                // "Book instance" must be tested before the "Book " prefix
                let code = if msg.starts_with("Book instance ") {
                    ErrorCode::NoSuchInstance
                } else if msg.starts_with("Book ") {
                    ErrorCode::NoSuchBook
                } else if msg.starts_with("Author ") {
                    ErrorCode::NoSuchAuthor
                } else if msg.starts_with("Genre ") {
                    ErrorCode::NoSuchGenre
                } else if msg.starts_with("User ") {
                    ErrorCode::NoSuchUser
                } else {
                    ErrorCode::Failure
                };
                (StatusCode::NOT_FOUND, code, msg.clone(), None)
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone(), None)
            }
            AppError::FieldValidation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadValue,
                message.clone(),
                Some(field.clone()),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Conflict(msg) => {
                let code = if msg.contains("instances") {
                    ErrorCode::BookHasInstances
                } else {
                    ErrorCode::Duplicate
                };
                (StatusCode::CONFLICT, code, msg.clone(), None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            field,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Convert `validator` derive failures into a field-level error on the
/// first offending field.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        for (field, field_errors) in errors.field_errors() {
            if let Some(first) = field_errors.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {}", field));
                return AppError::field(field, message);
            }
        }
        AppError::Validation("invalid request".to_string())
    }
}
