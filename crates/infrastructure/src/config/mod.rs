//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `database`: SQLite database settings
//! - `queue`: observation channel and intake consumer
//! - `jobs`: job scheduler and metrics
//!
//! Sources, later ones winning: built-in defaults, an optional `config.toml`
//! (or the file passed on the command line), then `FORECAST_*` environment
//! variables with `__` between section and key, e.g.
//! `FORECAST_QUEUE__REDIS_URL=redis://localhost:6379`.

mod database;
mod jobs;
mod queue;
mod server;

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

pub use database::DatabaseConfig;
pub use jobs::{MetricsAppConfig, SchedulerAppConfig};
pub use queue::QueueConfig;
pub use server::{LogFormat, ServerConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FORECAST";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
///
/// Production hides internal error details from HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub scheduler: SchedulerAppConfig,

    #[serde(default)]
    pub metrics: MetricsAppConfig,
}

impl AppConfig {
    /// Load from `config.toml` in the working directory (if present) and
    /// the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required when given) and the environment.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let builder = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Whether running in production
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
