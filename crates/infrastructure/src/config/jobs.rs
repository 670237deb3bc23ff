//! Background job and metrics configuration.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Job scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerAppConfig {
    /// Enable the scheduler; queueing jobs fails with 503 when disabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay before a queued processing job runs, in milliseconds
    #[serde(default = "default_job_delay_ms")]
    pub job_delay_ms: u64,

    /// Cron expression (with seconds) for the heartbeat job
    #[serde(default = "default_heartbeat_cron")]
    pub heartbeat_cron: String,
}

const fn default_job_delay_ms() -> u64 {
    1000
}

fn default_heartbeat_cron() -> String {
    "0 * * * * *".to_string()
}

impl Default for SchedulerAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job_delay_ms: default_job_delay_ms(),
            heartbeat_cron: default_heartbeat_cron(),
        }
    }
}

/// Prometheus metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsAppConfig {
    /// Expose `/metrics` and record counters
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsAppConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
