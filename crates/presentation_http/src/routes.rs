//! Route definitions

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::{handlers, middleware::RequestIdLayer, openapi, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_size_json_bytes;

    Router::new()
        .route("/", get(|| async { Redirect::temporary("/swagger-ui/") }))
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Forecasts
        .route("/forecasts", get(handlers::forecasts::list_forecasts))
        .route("/forecasts/{date}", get(handlers::forecasts::get_forecast))
        .route("/forecast", post(handlers::forecasts::create_forecast))
        .route(
            "/forecast/publish-random",
            post(handlers::forecasts::publish_random),
        )
        // Background jobs
        .route("/forecast/process", post(handlers::forecasts::process))
        .route(
            "/forecast/process2",
            post(handlers::forecasts::process_by_location),
        )
        .merge(openapi::create_openapi_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestIdLayer::new())
        .with_state(state)
}
