//! Database (SQLite) configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::default_true;
use crate::persistence::AsyncDatabaseConfig;

/// SQLite database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Maximum number of concurrent database connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the write lock, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Whether to run pending migrations on startup (default: true)
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_db_path() -> String {
    "forecasts.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Pool settings for this configuration
    #[must_use]
    pub fn to_pool_config(&self) -> AsyncDatabaseConfig {
        let base = if self.path == ":memory:" {
            AsyncDatabaseConfig::in_memory()
        } else {
            AsyncDatabaseConfig {
                max_connections: self.max_connections,
                ..AsyncDatabaseConfig::file(&self.path)
            }
        };
        AsyncDatabaseConfig {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            ..base
        }
    }
}
