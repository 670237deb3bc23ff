//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the SQLite forecast
//! store, the observation channels, Prometheus metrics and the job scheduler.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod scheduled_tasks;
pub mod scheduler;

pub use adapters::*;
pub use config::{
    AppConfig, DatabaseConfig, Environment, LogFormat, MetricsAppConfig, QueueConfig,
    SchedulerAppConfig, ServerConfig,
};
pub use persistence::{AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, SqliteForecastStore};
pub use scheduled_tasks::{HEARTBEAT_TASK, create_heartbeat_task, register_heartbeat};
pub use scheduler::{SchedulerConfig, SchedulerError, TaskScheduler, TaskStats};
