//! Storyforge — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storyforge_core::error::OrchestrationError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `OrchestrationError` that implements
/// `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub OrchestrationError);

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            OrchestrationError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            OrchestrationError::AlreadyInProgress(_) => {
                (StatusCode::CONFLICT, "already_in_progress")
            }
            OrchestrationError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            OrchestrationError::RateLimited(_) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
            }
            OrchestrationError::Remote(_) => (StatusCode::BAD_GATEWAY, "remote_error"),
            // Stale responses are dropped inside the core; one escaping to
            // the HTTP layer is a bug.
            OrchestrationError::Stale => (StatusCode::INTERNAL_SERVER_ERROR, "stale_response"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: OrchestrationError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(OrchestrationError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_already_in_progress_maps_to_409() {
        assert_eq!(
            status_of(OrchestrationError::AlreadyInProgress("chapter:x".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_invalid_state_maps_to_409() {
        assert_eq!(
            status_of(OrchestrationError::InvalidState("no project".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        assert_eq!(
            status_of(OrchestrationError::RateLimited("slow down".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_remote_maps_to_502() {
        assert_eq!(
            status_of(OrchestrationError::Remote("upstream down".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_stale_maps_to_500() {
        assert_eq!(
            status_of(OrchestrationError::Stale),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
