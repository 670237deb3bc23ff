//! Value Objects - Immutable, identity-less domain primitives

mod forecast_date;
mod forecast_id;
mod summary;

pub use forecast_date::ForecastDate;
pub use forecast_id::ForecastId;
pub use summary::FORECAST_SUMMARIES;
