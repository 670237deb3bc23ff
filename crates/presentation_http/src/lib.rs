//! Forecast HTTP presentation layer
//!
//! axum router, handlers, OpenAPI docs and the background intake task
//! behind the `forecast-server` binary.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod tasks;

pub use error::{ApiError, set_expose_internal_errors};
pub use middleware::{RequestIdLayer, ValidatedJson, ValidationError};
pub use routes::create_router;
pub use state::AppState;
