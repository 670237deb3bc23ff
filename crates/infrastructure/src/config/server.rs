//! HTTP server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::default_true;

/// Log output of the server binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Listener, CORS and request limits of the forecast API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Origins allowed by CORS; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Grace period for in-flight requests and the intake task on shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Upper bound for `POST /forecast` bodies
    #[serde(default = "default_max_body_json")]
    pub max_body_size_json_bytes: usize,
}

impl ServerConfig {
    /// `host:port` to bind the listener to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

const fn default_max_body_json() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            allowed_origins: Vec::new(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            log_format: LogFormat::default(),
            max_body_size_json_bytes: default_max_body_json(),
        }
    }
}
