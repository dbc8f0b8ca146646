use crate::services::{storage_service::StorageError, validation::ValidationError};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// HTTP-facing error: a status, a human-readable message and optional details.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            details: None,
        }
    }

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Map a storage failure for `action` ("upload", "delete").
    ///
    /// Validation problems become 400 with their own message. Backend failures
    /// become 500 (504 for cloud timeouts); the underlying cause is attached
    /// as details only outside production.
    pub fn from_storage(err: StorageError, action: &str, production: bool) -> Self {
        let base = match &err {
            StorageError::Validation(validation) => {
                return Self::bad_request(validation.to_string());
            }
            StorageError::Timeout(_) => Self::new(
                StatusCode::GATEWAY_TIMEOUT,
                format!("Timed out trying to {} file", action),
            ),
            _ => Self::internal(format!("Failed to {} file", action)),
        };

        tracing::error!(action, error = %err, "storage operation failed");
        if production {
            base
        } else {
            base.with_details(err.to_string())
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Map a multipart read failure while accepting an upload.
    ///
    /// A body over the transport limit is reported with the same wording as
    /// the size check, as a 400. Server-side failures keep their status.
    pub fn from_multipart(err: MultipartError, max_bytes: usize) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => {
                Self::bad_request(ValidationError::BodyTooLarge { max: max_bytes }.to_string())
            }
            status if status.is_server_error() => AppError::new(status, err.body_text()),
            _ => Self::bad_request(err.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests_without_details() {
        let err = AppError::from_storage(
            StorageError::Validation(ValidationError::MissingFile),
            "upload",
            false,
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "No file provided");
        assert!(err.details.is_none());
    }

    #[test]
    fn details_only_outside_production() {
        let io = || StorageError::Io(std::io::Error::other("disk full"));

        let dev = AppError::from_storage(io(), "upload", false);
        assert_eq!(dev.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(dev.details.as_deref(), Some("disk full"));

        let prod = AppError::from_storage(io(), "upload", true);
        assert!(prod.details.is_none());
    }

    #[test]
    fn timeouts_are_gateway_timeouts() {
        let err = AppError::from_storage(StorageError::Timeout("slow".into()), "delete", true);
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
    }
}
