//! Application services - Use case implementations

mod forecast_intake;
mod forecast_processor;
mod forecast_publisher;
mod forecast_reconciler;
mod forecast_service;
mod observation_codec;
#[cfg(test)]
pub(crate) mod test_support;

pub use forecast_intake::{ForecastIntakeService, IntakeOutcome, IntakeReport};
pub use forecast_processor::{
    DEFAULT_JOB_DELAY, ForecastProcessor, ForecastStats, LocationStats, ProcessingJob,
};
pub use forecast_publisher::{ForecastPublisher, SAMPLE_CITIES, random_observation};
pub use forecast_reconciler::{ForecastReconciler, ReconcileOutcome};
pub use forecast_service::{ForecastService, NewForecast};
pub use observation_codec::{
    EXTENDED_MESSAGE_TYPE, LEGACY_MESSAGE_TYPE, ObservationMessage, decode_observation,
};
