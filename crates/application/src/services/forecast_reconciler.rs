//! Forecast reconciler
//!
//! Applies one observation to the store: the matching record is updated in
//! place, otherwise a new record is inserted. Legacy observations match on
//! date alone, extended observations on date and exact location.

use std::{fmt, sync::Arc};

use domain::{ForecastId, ForecastKey, ForecastObservation, ForecastRecord, ObservationVariant};
use tracing::{debug, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{ForecastMetricsPort, ForecastStorePort},
};

/// Which write a reconcile performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileOutcome {
    /// No record matched; a new one was created
    Inserted(ForecastId),
    /// An existing record was overwritten
    Updated(ForecastId),
}

impl ReconcileOutcome {
    /// Id of the record that was written
    #[must_use]
    pub const fn id(&self) -> ForecastId {
        match self {
            Self::Inserted(id) | Self::Updated(id) => *id,
        }
    }

    /// Stable label used for logs and metric labels
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Inserted(_) => "inserted",
            Self::Updated(_) => "updated",
        }
    }
}

/// Find-or-create for forecast records
#[derive(Clone)]
pub struct ForecastReconciler {
    store: Arc<dyn ForecastStorePort>,
    metrics: Arc<dyn ForecastMetricsPort>,
}

impl fmt::Debug for ForecastReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastReconciler").finish_non_exhaustive()
    }
}

impl ForecastReconciler {
    #[must_use]
    pub fn new(store: Arc<dyn ForecastStorePort>, metrics: Arc<dyn ForecastMetricsPort>) -> Self {
        Self { store, metrics }
    }

    /// Apply `observation` in a single transaction.
    ///
    /// Exactly one write is committed before this returns `Ok`. Store
    /// failures are returned as-is and nothing is retried.
    #[instrument(
        skip(self, observation),
        fields(key = %observation.key(), variant = %observation.variant())
    )]
    pub async fn reconcile(
        &self,
        observation: &ForecastObservation,
    ) -> Result<ReconcileOutcome, ApplicationError> {
        let mut tx = self.store.begin().await?;

        let existing = match observation.key() {
            ForecastKey::Date(date) => tx.find_by_date(date).await?,
            ForecastKey::DateAndLocation(date, location) => {
                tx.find_by_date_and_location(date, &location).await?
            },
        };

        let outcome = match existing {
            Some(mut record) => {
                if observation.variant() == ObservationVariant::Legacy {
                    if let Some(location) = &record.location {
                        warn!(
                            id = %record.id,
                            location = %location,
                            "Legacy observation matched by date only; overwriting a located forecast"
                        );
                    }
                }
                record.apply(observation);
                tx.update(&record).await?;
                ReconcileOutcome::Updated(record.id)
            },
            None => {
                let record = ForecastRecord::from_observation(observation);
                tx.insert(&record).await?;
                ReconcileOutcome::Inserted(record.id)
            },
        };

        tx.commit().await?;

        debug!(id = %outcome.id(), outcome = outcome.label(), "Forecast reconciled");
        self.metrics.reconciled(outcome);
        Ok(outcome)
    }
}
