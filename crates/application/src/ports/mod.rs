//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod database_health;
mod forecast_metrics;
mod forecast_store;
mod job_scheduler;
mod observation_channel;

pub use database_health::DatabaseHealth;
#[cfg(test)]
pub use forecast_metrics::MockForecastMetricsPort;
pub use forecast_metrics::{ForecastMetricsPort, IntakeFailureKind, NoopForecastMetrics};
#[cfg(test)]
pub use forecast_store::MockForecastStorePort;
pub use forecast_store::{ForecastStorePort, ForecastTransaction};
pub use job_scheduler::{JobSchedulerPort, ScheduledJob};
#[cfg(test)]
pub use observation_channel::MockObservationChannelPort;
pub use observation_channel::{Delivery, ObservationChannelPort};
