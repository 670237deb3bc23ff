//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod in_memory_observation_channel;
mod prometheus_metrics;
mod redis_observation_channel;

pub use in_memory_observation_channel::{
    DEAD_LETTER_CAPACITY, DeadLetter, InMemoryObservationChannel,
};
pub use prometheus_metrics::{
    INTAKE_FAILURE_COUNTER, JOBS_COUNTER, PROCESSING_COUNTER, PrometheusForecastMetrics,
    RECONCILE_COUNTER,
};
pub use redis_observation_channel::{ChannelError, RedisChannelConfig, RedisObservationChannel};
