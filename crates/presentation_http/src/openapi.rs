//! OpenAPI documentation module
//!
//! Serves the OpenAPI 3 document and Swagger UI for the forecast API.

// Allow clippy warnings from macro-generated code in utoipa derive
#![allow(clippy::needless_for_each)]

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{handlers, state::AppState};

/// Path of the generated OpenAPI document
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI documentation for the forecast API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Forecast API",
        version = "0.1.0",
        description = "Weather forecasts reconciled from a message channel, with direct reads and writes",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "forecasts", description = "Stored forecasts and observation publishing"),
        (name = "jobs", description = "Background processing jobs"),
        (name = "health", description = "Liveness and readiness probes"),
        (name = "metrics", description = "Prometheus metrics")
    ),
    paths(
        handlers::forecasts::list_forecasts,
        handlers::forecasts::get_forecast,
        handlers::forecasts::create_forecast,
        handlers::forecasts::publish_random,
        handlers::forecasts::process,
        handlers::forecasts::process_by_location,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::metrics::get_metrics,
    ),
    components(
        schemas(
            handlers::forecasts::ForecastResponse,
            handlers::forecasts::CreateForecastRequest,
            handlers::health::HealthResponse,
            handlers::health::ReadinessResponse,
            handlers::health::DatabaseStatus,
            crate::error::ErrorResponse,
        )
    )
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Create OpenAPI documentation routes
///
/// - `/api-docs/openapi.json` - OpenAPI document
/// - `/swagger-ui/` - Swagger UI
pub fn create_openapi_routes() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
}
