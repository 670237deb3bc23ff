//! Background tasks for the HTTP presentation layer

mod forecast_intake;

pub use forecast_intake::spawn_forecast_intake_task;
