//! Error types for brewlog-api
//!
//! Validation failures are client errors (400); an unreachable store is 503;
//! any other storage rejection is 500. Not-found is never an error here.

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use brewlog_common::ValidationError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid input field (400)
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Body could not be decoded (400)
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    /// Store unreachable within the configured timeout (503)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Store rejected the operation (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<brewlog_common::Error> for ApiError {
    fn from(err: brewlog_common::Error) -> Self {
        use brewlog_common::Error;
        match err {
            Error::Validation(e) => ApiError::Validation(e),
            Error::StorageUnavailable(msg) => ApiError::StorageUnavailable(msg),
            Error::Storage(msg) => ApiError::Storage(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            error!("{}", self);
        }

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        });
        if let ApiError::Validation(e) = &self {
            if let Some(field) = e.field() {
                body["error"]["field"] = json!(field);
            }
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
