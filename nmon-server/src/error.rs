//! HTTP error type
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}` with a
//! matching status code.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Role not allowed to perform the operation (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflicts with current state, e.g. report already moderated (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Report rejected by the deduplication filter (409)
    #[error("Duplicate of report {duplicate_of}")]
    DuplicateReport { duplicate_of: String },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// nmon-common error
    #[error(transparent)]
    Common(#[from] nmon_common::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(nmon_common::Error::Database(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use nmon_common::Error as Common;

        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::DuplicateReport { .. } => (StatusCode::CONFLICT, "DUPLICATE_REPORT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Common(err) => match err {
                Common::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Common::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                Common::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                Common::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
                Common::Io(_) | Common::Config(_) | Common::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", self);
        }

        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = match self {
            ApiError::DuplicateReport { duplicate_of } => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                    "duplicate_of": duplicate_of,
                }
            }),
            _ => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
