//! Forecast metrics port
//!
//! Counters for the intake pipeline and background jobs. Injected into the
//! services so nothing records into process-global state directly.

#[cfg(test)]
use mockall::automock;

use domain::ObservationVariant;

use crate::services::ReconcileOutcome;

/// Why an inbound message was not reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeFailureKind {
    /// Unknown type, bad JSON or unparseable date
    Malformed,
    /// The store rejected the write
    Reconcile,
    /// Moved to the dead-letter stream after too many deliveries
    DeadLettered,
}

impl IntakeFailureKind {
    /// Stable label used for metric labels
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Reconcile => "reconcile",
            Self::DeadLettered => "dead_lettered",
        }
    }
}

/// Port for recording forecast metrics
#[cfg_attr(test, automock)]
pub trait ForecastMetricsPort: Send + Sync {
    /// An observation was decoded and is about to be reconciled
    fn observation_received(&self, variant: ObservationVariant);

    /// A reconcile committed
    fn reconciled(&self, outcome: ReconcileOutcome);

    /// An inbound message failed
    fn intake_failed(&self, kind: IntakeFailureKind);

    /// A background job ran to completion
    fn job_completed(&self, job: &str);
}

/// Metrics sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopForecastMetrics;

impl ForecastMetricsPort for NoopForecastMetrics {
    fn observation_received(&self, _variant: ObservationVariant) {}

    fn reconciled(&self, _outcome: ReconcileOutcome) {}

    fn intake_failed(&self, _kind: IntakeFailureKind) {}

    fn job_completed(&self, _job: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ForecastMetricsPort>();
    }

    #[test]
    fn failure_labels() {
        assert_eq!(IntakeFailureKind::Malformed.label(), "malformed");
        assert_eq!(IntakeFailureKind::DeadLettered.label(), "dead_lettered");
    }
}
