//! Application layer - Use cases and orchestration
//!
//! Defines the ports the forecast pipeline needs (store, observation
//! channel, metrics, job scheduler) and the services that drive them:
//! reconcile, intake, publish and background processing.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
