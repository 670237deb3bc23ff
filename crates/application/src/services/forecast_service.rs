//! Forecast service
//!
//! Read and direct-write operations behind the HTTP surface. Direct writes
//! go straight to the store without the reconcile lookup.

use std::{fmt, sync::Arc};

use domain::{ForecastDate, ForecastRecord};
use tracing::{info, instrument};

use crate::{error::ApplicationError, ports::ForecastStorePort};

/// Input for a direct insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForecast {
    pub date: ForecastDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
    pub location: Option<String>,
}

/// Service for listing, looking up and inserting forecasts
#[derive(Clone)]
pub struct ForecastService {
    store: Arc<dyn ForecastStorePort>,
}

impl fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastService").finish_non_exhaustive()
    }
}

impl ForecastService {
    #[must_use]
    pub fn new(store: Arc<dyn ForecastStorePort>) -> Self {
        Self { store }
    }

    /// Every stored forecast
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ForecastRecord>, ApplicationError> {
        self.store.list_all().await
    }

    /// Look up one forecast. Without a location the first record for the
    /// date is returned, matching how legacy observations are keyed.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        date: ForecastDate,
        location: Option<&str>,
    ) -> Result<ForecastRecord, ApplicationError> {
        let found = match location {
            Some(location) => self.store.find_by_date_and_location(date, location).await?,
            None => self.store.find_by_date(date).await?,
        };

        found.ok_or_else(|| {
            let key = location.map_or_else(|| date.to_string(), |l| format!("{date}@{l}"));
            ApplicationError::NotFound(format!("forecast {key}"))
        })
    }

    /// Insert a forecast as given.
    ///
    /// An existing record with the same key makes the store reject the
    /// write with `ApplicationError::Persistence`.
    #[instrument(skip(self, forecast), fields(date = %forecast.date))]
    pub async fn create(&self, forecast: NewForecast) -> Result<ForecastRecord, ApplicationError> {
        if let Some(location) = &forecast.location {
            if location.trim().is_empty() {
                return Err(ApplicationError::Validation(
                    "location must not be empty".to_string(),
                ));
            }
        }

        let mut record = ForecastRecord::new(forecast.date, forecast.temperature_c, forecast.summary);
        record.location = forecast.location;

        let stored = self.store.insert(&record).await?;
        info!(id = %stored.id, "Forecast created");
        Ok(stored)
    }
}
