//! Persistence module
//!
//! SQLite-backed forecast storage on a shared sqlx pool.

pub mod async_connection;
pub mod error;
pub mod forecast_store;

pub use async_connection::{AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError};
pub use error::map_sqlx_error;
pub use forecast_store::SqliteForecastStore;
