//! Application state shared across handlers

use std::sync::Arc;

use application::{
    ports::ForecastStorePort,
    services::{ForecastProcessor, ForecastPublisher, ForecastService},
};
use infrastructure::{AppConfig, PrometheusForecastMetrics};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Listing, lookup and direct inserts
    pub forecast_service: Arc<ForecastService>,
    /// Publishes observations onto the message channel
    pub publisher: Arc<ForecastPublisher>,
    /// Queues background processing jobs
    pub processor: Arc<ForecastProcessor>,
    /// Store probed by the readiness check
    pub store: Arc<dyn ForecastStorePort>,
    /// Prometheus exporter, absent when metrics are disabled
    pub metrics: Option<Arc<PrometheusForecastMetrics>>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("metrics_enabled", &self.metrics.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
