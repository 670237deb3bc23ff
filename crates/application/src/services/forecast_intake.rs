//! Forecast intake service
//!
//! Consumes observation messages from the channel. Each message is decoded,
//! reconciled once and acknowledged only after the reconcile committed. A
//! message that fails stays unacknowledged so the channel hands it out again;
//! once it has been handed out more than `max_deliveries` times it is moved
//! to the dead-letter stream instead.

use std::{fmt, sync::Arc};

use tracing::{info, instrument, warn};

use super::{
    forecast_reconciler::{ForecastReconciler, ReconcileOutcome},
    observation_codec::decode_observation,
};
use crate::{
    error::ApplicationError,
    ports::{Delivery, ForecastMetricsPort, IntakeFailureKind, ObservationChannelPort},
};

/// Result of handling one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Reconciled and acknowledged
    Reconciled(ReconcileOutcome),
    /// Moved to the dead-letter stream
    DeadLettered,
}

/// Tally of one `poll_once` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub received: usize,
    pub reconciled: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Service that drains the observation channel into the reconciler
#[derive(Clone)]
pub struct ForecastIntakeService {
    reconciler: ForecastReconciler,
    channel: Arc<dyn ObservationChannelPort>,
    metrics: Arc<dyn ForecastMetricsPort>,
    max_deliveries: Option<u64>,
}

impl fmt::Debug for ForecastIntakeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastIntakeService")
            .field("max_deliveries", &self.max_deliveries)
            .finish_non_exhaustive()
    }
}

impl ForecastIntakeService {
    #[must_use]
    pub fn new(
        reconciler: ForecastReconciler,
        channel: Arc<dyn ObservationChannelPort>,
        metrics: Arc<dyn ForecastMetricsPort>,
    ) -> Self {
        Self {
            reconciler,
            channel,
            metrics,
            max_deliveries: None,
        }
    }

    /// Dead-letter messages handed out more than `max` times
    #[must_use]
    pub const fn with_max_deliveries(mut self, max: u64) -> Self {
        self.max_deliveries = Some(max);
        self
    }

    /// Handle one delivery.
    ///
    /// # Errors
    ///
    /// Returns the decode or reconcile error; the delivery is then left
    /// unacknowledged.
    #[instrument(skip(self, delivery), fields(id = %delivery.id, message_type = %delivery.message_type))]
    pub async fn handle(&self, delivery: &Delivery) -> Result<IntakeOutcome, ApplicationError> {
        if self
            .max_deliveries
            .is_some_and(|max| delivery.delivery_count > max)
        {
            warn!(
                delivery_count = delivery.delivery_count,
                "Delivery limit exceeded, dead-lettering message"
            );
            self.channel
                .dead_letter(delivery, "max deliveries exceeded")
                .await?;
            self.metrics.intake_failed(IntakeFailureKind::DeadLettered);
            return Ok(IntakeOutcome::DeadLettered);
        }

        let observation = decode_observation(&delivery.message_type, &delivery.payload)
            .inspect_err(|_| self.metrics.intake_failed(IntakeFailureKind::Malformed))?;

        info!(
            date = %observation.date(),
            temperature_c = observation.temperature_c(),
            summary = observation.summary().unwrap_or_default(),
            location = observation.location().unwrap_or_default(),
            "Received forecast observation"
        );
        self.metrics.observation_received(observation.variant());

        let outcome = self
            .reconciler
            .reconcile(&observation)
            .await
            .inspect_err(|_| self.metrics.intake_failed(IntakeFailureKind::Reconcile))?;

        self.channel.ack(delivery).await?;
        Ok(IntakeOutcome::Reconciled(outcome))
    }

    /// Receive one batch and handle every delivery in it.
    ///
    /// Per-message failures are logged and counted; only a failing
    /// `receive` is returned as an error.
    pub async fn poll_once(&self, batch_size: usize) -> Result<IntakeReport, ApplicationError> {
        let deliveries = self.channel.receive(batch_size).await?;
        let mut report = IntakeReport {
            received: deliveries.len(),
            ..IntakeReport::default()
        };

        for delivery in &deliveries {
            match self.handle(delivery).await {
                Ok(IntakeOutcome::Reconciled(_)) => report.reconciled += 1,
                Ok(IntakeOutcome::DeadLettered) => report.dead_lettered += 1,
                Err(e) => {
                    warn!(
                        id = %delivery.id,
                        error = %e,
                        "Observation not processed, leaving it for redelivery"
                    );
                    report.failed += 1;
                },
            }
        }

        Ok(report)
    }
}
