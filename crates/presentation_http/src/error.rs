//! API error handling
//!
//! Maps application errors to HTTP status codes and a JSON body of the form
//! `{"error": ..., "code": ..., "details": ...}`. In production, internal
//! error details are left out of the response.

use std::sync::atomic::{AtomicBool, Ordering};

use application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Whether 500 responses carry the underlying error text
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Configure whether internal error details are included in responses.
///
/// Set to `false` in production.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

fn should_expose_details() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            Self::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
            Self::Internal(msg) => {
                error!(error = %msg, "Request failed with internal error");
                let details = should_expose_details().then_some(msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    details,
                )
            },
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(DomainError::NotFound { .. }) => Self::NotFound(err.to_string()),
            ApplicationError::Domain(e) => Self::BadRequest(e.to_string()),
            ApplicationError::Validation(msg) => Self::BadRequest(msg),
            ApplicationError::NotFound(msg) => Self::NotFound(msg),
            ApplicationError::ServiceUnavailable(msg) => Self::ServiceUnavailable(msg),
            ApplicationError::Persistence(_)
            | ApplicationError::Messaging(_)
            | ApplicationError::Configuration(_)
            | ApplicationError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_messages() {
        assert_eq!(
            ApiError::BadRequest("invalid input".to_string()).to_string(),
            "Bad request: invalid input"
        );
        assert_eq!(
            ApiError::NotFound("forecast 2024-01-01".to_string()).to_string(),
            "Not found: forecast 2024-01-01"
        );
    }

    #[test]
    fn error_response_omits_empty_details() {
        let resp = ErrorResponse {
            error: "Bad request".to_string(),
            code: "bad_request".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"code\":\"bad_request\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let api: ApiError = ApplicationError::Validation("location must not be empty".into()).into();
        assert!(matches!(api, ApiError::BadRequest(ref m) if m.contains("location")));
        assert_eq!(api.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_date_maps_to_bad_request() {
        let api: ApiError =
            ApplicationError::Domain(DomainError::InvalidDateTime("yesterday".into())).into();
        assert_eq!(api.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let api: ApiError = ApplicationError::NotFound("forecast 2024-01-01".into()).into();
        assert_eq!(api.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn disabled_scheduler_maps_to_503() {
        let api: ApiError = ApplicationError::ServiceUnavailable("disabled".into()).into();
        assert_eq!(api.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn persistence_maps_to_500() {
        let api: ApiError = ApplicationError::Persistence("Constraint violation".into()).into();
        assert!(matches!(api, ApiError::Internal(ref m) if m.contains("Constraint violation")));
        assert_eq!(
            api.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
