//! Health check handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the server running?
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is running", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: DatabaseStatus,
    /// Whether processing jobs can be queued
    pub scheduler: bool,
}

/// Status of the forecast store
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseStatus {
    pub healthy: bool,
    pub version: Option<String>,
    pub response_time_ms: Option<u64>,
}

/// Readiness check - can the store be reached?
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to serve", body = ReadinessResponse),
        (status = 503, description = "Store unreachable", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let health = state.store.health().await;
    let database = match health {
        Ok(h) => DatabaseStatus {
            healthy: h.reachable,
            version: h.version,
            response_time_ms: h.response_time_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            DatabaseStatus {
                healthy: false,
                version: None,
                response_time_ms: None,
            }
        },
    };

    let ready = database.healthy;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            ready,
            database,
            scheduler: state.processor.can_enqueue(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_check_returns_ok() {
        let response = health_check().await;
        assert_eq!(response.status, "ok");
        assert!(!response.version.is_empty());
    }

    #[test]
    fn readiness_response_serialization() {
        let resp = ReadinessResponse {
            ready: true,
            database: DatabaseStatus {
                healthy: true,
                version: Some("3.45.0".to_string()),
                response_time_ms: Some(1),
            },
            scheduler: false,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"ready\":true"));
        assert!(json.contains("3.45.0"));
        assert!(json.contains("\"scheduler\":false"));
    }

    #[test]
    fn readiness_response_deserialization() {
        let json = r#"{"ready":false,"database":{"healthy":false,"version":null,"response_time_ms":null},"scheduler":true}"#;
        let resp: ReadinessResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.ready);
        assert!(!resp.database.healthy);
        assert!(resp.scheduler);
    }
}
