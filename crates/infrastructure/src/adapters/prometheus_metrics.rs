//! Prometheus forecast metrics
//!
//! Records into a recorder owned by this adapter instead of the global one,
//! so several instances (one per test, say) never see each other's counts.

use std::fmt;

use application::{
    ports::{ForecastMetricsPort, IntakeFailureKind},
    services::ReconcileOutcome,
};
use domain::ObservationVariant;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

/// Incoming observations, labelled by variant
pub const PROCESSING_COUNTER: &str = "api_forecast_processing";
/// Committed reconciles, labelled by outcome
pub const RECONCILE_COUNTER: &str = "forecast_reconcile_total";
/// Failed intake messages, labelled by kind
pub const INTAKE_FAILURE_COUNTER: &str = "forecast_intake_failures_total";
/// Finished background jobs, labelled by job name
pub const JOBS_COUNTER: &str = "forecast_jobs_completed_total";

/// Forecast metrics exported in the Prometheus text format
pub struct PrometheusForecastMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl fmt::Debug for PrometheusForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusForecastMetrics").finish_non_exhaustive()
    }
}

impl Default for PrometheusForecastMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusForecastMetrics {
    #[must_use]
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        Self { recorder, handle }
    }

    /// Current metrics in the Prometheus exposition format
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }

    fn increment(&self, f: impl FnOnce() -> metrics::Counter) {
        metrics::with_local_recorder(&self.recorder, || f().increment(1));
    }
}

impl ForecastMetricsPort for PrometheusForecastMetrics {
    fn observation_received(&self, variant: ObservationVariant) {
        self.increment(|| counter!(PROCESSING_COUNTER, "variant" => variant.label()));
    }

    fn reconciled(&self, outcome: ReconcileOutcome) {
        self.increment(|| counter!(RECONCILE_COUNTER, "outcome" => outcome.label()));
    }

    fn intake_failed(&self, kind: IntakeFailureKind) {
        self.increment(|| counter!(INTAKE_FAILURE_COUNTER, "kind" => kind.label()));
    }

    fn job_completed(&self, job: &str) {
        let job = job.to_string();
        self.increment(|| counter!(JOBS_COUNTER, "job" => job));
    }
}
