//! Observation channel configuration.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Message channel and intake consumer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis URL; without one an in-process channel is used
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Stream observations are published to
    #[serde(default = "default_stream_key")]
    pub stream_key: String,

    /// Stream poisoned messages are moved to
    #[serde(default = "default_dead_letter_key")]
    pub dead_letter_key: String,

    /// Consumer group shared by all intake workers
    #[serde(default = "default_group")]
    pub consumer_group: String,

    /// This process's consumer name within the group
    #[serde(default = "default_consumer")]
    pub consumer_name: String,

    /// Run the intake consumer in this process
    #[serde(default = "default_true")]
    pub intake_enabled: bool,

    /// Messages fetched per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How long a poll waits for new messages, in milliseconds
    #[serde(default = "default_block_ms")]
    pub block_ms: u64,

    /// Unacknowledged messages older than this are redelivered, in milliseconds
    #[serde(default = "default_redelivery_ms")]
    pub redelivery_after_ms: u64,

    /// Deliveries after which a message is dead-lettered
    #[serde(default = "default_max_deliveries")]
    pub max_deliveries: u64,
}

fn default_stream_key() -> String {
    "forecasts:observations".to_string()
}

fn default_dead_letter_key() -> String {
    "forecasts:observations:dead".to_string()
}

fn default_group() -> String {
    "forecast-intake".to_string()
}

fn default_consumer() -> String {
    "forecast-server".to_string()
}

const fn default_batch_size() -> usize {
    10
}

const fn default_block_ms() -> u64 {
    2000
}

const fn default_redelivery_ms() -> u64 {
    30_000
}

const fn default_max_deliveries() -> u64 {
    5
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            stream_key: default_stream_key(),
            dead_letter_key: default_dead_letter_key(),
            consumer_group: default_group(),
            consumer_name: default_consumer(),
            intake_enabled: true,
            batch_size: default_batch_size(),
            block_ms: default_block_ms(),
            redelivery_after_ms: default_redelivery_ms(),
            max_deliveries: default_max_deliveries(),
        }
    }
}
