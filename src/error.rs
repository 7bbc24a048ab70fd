//! # Application Errors
//!
//! Central error type for every handler and report builder. All operations
//! propagate here and a single responder turns the error into the uniform
//! envelope; handlers never format error bodies locally.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type used across the crate
pub type AppResult<T> = Result<T, AppError>;

/// Application errors
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Bad or missing field, schema constraint violation, malformed
    /// query parameter. The message enumerates the failing constraint.
    #[error("{0}")]
    Validation(String),

    /// Identity absent in the requested collection
    #[error("No {resource} found with that ID")]
    NotFound { resource: &'static str },

    /// Payment gateway signature mismatch or call failure.
    /// The raw gateway message is surfaced.
    #[error("{0}")]
    Upstream(String),

    /// Unexpected persistence failure. Details are logged, never surfaced.
    #[error("Something went very wrong!")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        AppError::NotFound { resource }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope status string: "fail" for 4xx, "error" for 5xx
    pub fn status_label(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "internal error");
        }

        let status = self.status_code();
        let body = Json(json!({
            "status": self.status_label(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("tour").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Upstream("sig".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("oops".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(AppError::validation("x").status_label(), "fail");
        assert_eq!(AppError::Internal("x".into()).status_label(), "error");
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AppError::Internal("lock poisoned".into());
        assert!(!err.to_string().contains("lock"));
    }

    #[test]
    fn test_not_found_names_resource() {
        let err = AppError::not_found("tour");
        assert_eq!(err.to_string(), "No tour found with that ID");
    }
}
