use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;

/// Application-level error type.
///
/// Every variant renders as a short plain-text body; details of internal and
/// backend failures are logged, never returned.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// Upload exceeded the configured limit (bytes).
    PayloadTooLarge {
        limit: u64,
    },
    NotFound(String),
    BackendUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Image exceeds maximum size of {limit} bytes"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BackendUnavailable(detail) => {
                tracing::error!("Storage backend unavailable: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage is temporarily unavailable".into(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, format!("{message}\n")).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidHash(_) => {
                AppError::NotFound("No picture is found".into())
            }
            StorageError::SizeLimitExceeded { limit, .. } => AppError::PayloadTooLarge { limit },
            StorageError::BackendUnavailable(detail) => AppError::BackendUnavailable(detail),
            other => AppError::Internal(other.to_string()),
        }
    }
}
