//! Forecast record entity - The persisted reading for one key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::forecast_observation::{ForecastKey, ForecastObservation};
use crate::value_objects::{ForecastDate, ForecastId};

/// A stored forecast, at most one per `(date, location)` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    /// Surrogate key assigned at creation
    pub id: ForecastId,
    /// Calendar day this forecast is for
    pub date: ForecastDate,
    /// Temperature in degrees Celsius
    pub temperature_c: i32,
    /// Short label such as "Mild"
    pub summary: Option<String>,
    /// Location label, absent for records created from legacy readings
    pub location: Option<String>,
    /// When the record was first stored
    pub created_at: DateTime<Utc>,
    /// When temperature or summary last changed
    pub updated_at: DateTime<Utc>,
}

impl ForecastRecord {
    /// Create a new record without a location
    #[must_use]
    pub fn new(date: ForecastDate, temperature_c: i32, summary: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ForecastId::new(),
            date,
            temperature_c,
            summary,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set the location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Create the record an unmatched observation produces
    #[must_use]
    pub fn from_observation(observation: &ForecastObservation) -> Self {
        let record = Self::new(
            observation.date(),
            observation.temperature_c(),
            observation.summary().map(str::to_string),
        );
        match observation.location() {
            Some(location) => record.with_location(location),
            None => record,
        }
    }

    /// Overwrite temperature and summary from a matching observation.
    ///
    /// Identity, date and location are left untouched.
    pub fn apply(&mut self, observation: &ForecastObservation) {
        self.temperature_c = observation.temperature_c();
        self.summary = observation.summary().map(str::to_string);
        self.updated_at = Utc::now();
    }

    /// Temperature in degrees Fahrenheit, truncated toward zero.
    ///
    /// Saturates at the `i32` bounds for extreme readings.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn temperature_f(&self) -> i32 {
        let offset = (f64::from(self.temperature_c) / 0.5556).trunc();
        (32.0 + offset).clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }

    /// The exact key this record occupies
    #[must_use]
    pub fn key(&self) -> ForecastKey {
        match &self.location {
            Some(location) => ForecastKey::DateAndLocation(self.date, location.clone()),
            None => ForecastKey::Date(self.date),
        }
    }
}
