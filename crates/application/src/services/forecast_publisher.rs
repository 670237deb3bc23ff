//! Forecast publisher
//!
//! Generates synthetic extended observations and publishes them to the
//! channel, giving the intake pipeline something to consume.

use std::{fmt, sync::Arc};

use chrono::{Duration, Utc};
use domain::FORECAST_SUMMARIES;
use rand::Rng;
use tracing::{info, instrument};

use super::observation_codec::ObservationMessage;
use crate::{error::ApplicationError, ports::ObservationChannelPort};

/// Cities used for random observations
pub const SAMPLE_CITIES: [&str; 12] = [
    "Amsterdam",
    "Berlin",
    "Buenos Aires",
    "Cairo",
    "Lisbon",
    "Nairobi",
    "Oslo",
    "Paris",
    "Reykjavik",
    "Seoul",
    "Sydney",
    "Vancouver",
];

/// Random observation: date up to nine days ahead, temperature in
/// `-20..55` °C, one of the stock summaries and a sample city.
#[must_use]
pub fn random_observation() -> ObservationMessage {
    let mut rng = rand::rng();
    let date = Utc::now() + Duration::days(rng.random_range(0..10));
    let summary = FORECAST_SUMMARIES[rng.random_range(0..FORECAST_SUMMARIES.len())];
    let city = SAMPLE_CITIES[rng.random_range(0..SAMPLE_CITIES.len())];

    ObservationMessage {
        date: date.to_rfc3339(),
        temperature_c: rng.random_range(-20..55),
        summary: Some(summary.to_string()),
        location: Some(city.to_string()),
    }
}

/// Publishes observation messages to the channel
#[derive(Clone)]
pub struct ForecastPublisher {
    channel: Arc<dyn ObservationChannelPort>,
}

impl fmt::Debug for ForecastPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastPublisher").finish_non_exhaustive()
    }
}

impl ForecastPublisher {
    #[must_use]
    pub fn new(channel: Arc<dyn ObservationChannelPort>) -> Self {
        Self { channel }
    }

    /// Publish one message and return its channel id
    #[instrument(skip(self, message), fields(message_type = message.message_type()))]
    pub async fn publish(&self, message: &ObservationMessage) -> Result<String, ApplicationError> {
        let payload = message.to_json()?;
        let id = self
            .channel
            .publish(message.message_type(), &payload)
            .await?;
        info!(id = %id, date = %message.date, "Observation published");
        Ok(id)
    }

    /// Publish a random extended observation
    pub async fn publish_random(&self) -> Result<String, ApplicationError> {
        let message = random_observation();
        self.publish(&message).await
    }
}
