//! Domain entities - Objects with identity and lifecycle

mod forecast_observation;
mod forecast_record;

pub use forecast_observation::{ForecastKey, ForecastObservation, ObservationVariant};
pub use forecast_record::ForecastRecord;
