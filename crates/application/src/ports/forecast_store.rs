//! Forecast storage port
//!
//! Defines the interface for persisting and querying forecast records.
//! Adapters in the infrastructure layer implement this port using SQLite.

use async_trait::async_trait;
use domain::{ForecastDate, ForecastRecord};
#[cfg(test)]
use mockall::automock;

use super::DatabaseHealth;
use crate::error::ApplicationError;

/// One read-modify-write unit against the store.
///
/// Dropping a transaction without calling [`ForecastTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait ForecastTransaction: Send {
    /// First record for `date`, regardless of location
    async fn find_by_date(
        &mut self,
        date: ForecastDate,
    ) -> Result<Option<ForecastRecord>, ApplicationError>;

    /// Record for `date` at exactly `location`
    async fn find_by_date_and_location(
        &mut self,
        date: ForecastDate,
        location: &str,
    ) -> Result<Option<ForecastRecord>, ApplicationError>;

    /// Insert a new record
    async fn insert(&mut self, record: &ForecastRecord) -> Result<(), ApplicationError>;

    /// Overwrite temperature, summary and `updated_at` of an existing record
    async fn update(&mut self, record: &ForecastRecord) -> Result<(), ApplicationError>;

    /// Make every write durable
    async fn commit(self: Box<Self>) -> Result<(), ApplicationError>;
}

/// Port for forecast persistence operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ForecastStorePort: Send + Sync {
    /// First record for `date`, regardless of location
    async fn find_by_date(
        &self,
        date: ForecastDate,
    ) -> Result<Option<ForecastRecord>, ApplicationError>;

    /// Record for `date` at exactly `location`
    async fn find_by_date_and_location(
        &self,
        date: ForecastDate,
        location: &str,
    ) -> Result<Option<ForecastRecord>, ApplicationError>;

    /// Insert a new record and return it as stored
    async fn insert(&self, record: &ForecastRecord) -> Result<ForecastRecord, ApplicationError>;

    /// Overwrite temperature, summary and `updated_at` of an existing record
    async fn update(&self, record: &ForecastRecord) -> Result<(), ApplicationError>;

    /// Every stored record, ordered by date then location
    async fn list_all(&self) -> Result<Vec<ForecastRecord>, ApplicationError>;

    /// Start a transaction that holds the store's write lock until it ends
    async fn begin(&self) -> Result<Box<dyn ForecastTransaction>, ApplicationError>;

    /// Lightweight connectivity check
    async fn health(&self) -> Result<DatabaseHealth, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn ForecastStorePort, _: &dyn ForecastTransaction) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        fn assert_send<T: Send + ?Sized>() {}
        assert_send_sync::<dyn ForecastStorePort>();
        assert_send::<dyn ForecastTransaction>();
    }

    #[tokio::test]
    async fn mock_returns_configured_record() {
        let date = ForecastDate::from_ymd(2024, 1, 1).unwrap();
        let record = ForecastRecord::new(date, 5, Some("Cool".to_string()));
        let expected = record.clone();

        let mut mock = MockForecastStorePort::new();
        mock.expect_find_by_date()
            .withf(move |d| *d == date)
            .returning(move |_| Ok(Some(record.clone())));

        let found = mock.find_by_date(date).await.unwrap();
        assert_eq!(found, Some(expected));
    }
}
