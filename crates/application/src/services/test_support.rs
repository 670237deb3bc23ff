//! In-memory store used by the service tests

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use domain::{ForecastDate, ForecastRecord};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::ApplicationError,
    ports::{DatabaseHealth, ForecastStorePort, ForecastTransaction},
};

/// Store whose transactions hold one lock for their whole lifetime
#[derive(Debug, Clone, Default)]
pub struct InMemoryForecastStore {
    records: Arc<Mutex<Vec<ForecastRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<ForecastRecord> {
        self.records.lock().await.clone()
    }
}

fn first_by_date(records: &[ForecastRecord], date: ForecastDate) -> Option<ForecastRecord> {
    records.iter().find(|r| r.date == date).cloned()
}

fn first_by_key(
    records: &[ForecastRecord],
    date: ForecastDate,
    location: &str,
) -> Option<ForecastRecord> {
    records
        .iter()
        .find(|r| r.date == date && r.location.as_deref() == Some(location))
        .cloned()
}

fn insert_unique(
    records: &mut Vec<ForecastRecord>,
    record: &ForecastRecord,
) -> Result<(), ApplicationError> {
    if records.iter().any(|r| r.key() == record.key()) {
        return Err(ApplicationError::Persistence(format!(
            "UNIQUE constraint failed for {}",
            record.key()
        )));
    }
    records.push(record.clone());
    Ok(())
}

fn overwrite(
    records: &mut [ForecastRecord],
    record: &ForecastRecord,
) -> Result<(), ApplicationError> {
    let existing = records
        .iter_mut()
        .find(|r| r.id == record.id)
        .ok_or_else(|| ApplicationError::Persistence(format!("no row {}", record.id)))?;
    existing.temperature_c = record.temperature_c;
    existing.summary.clone_from(&record.summary);
    existing.updated_at = record.updated_at;
    Ok(())
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Vec<ForecastRecord>>,
    staged: Vec<ForecastRecord>,
    fail_writes: bool,
}

impl InMemoryTransaction {
    fn check_writable(&self) -> Result<(), ApplicationError> {
        if self.fail_writes {
            return Err(ApplicationError::Persistence("disk I/O error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ForecastTransaction for InMemoryTransaction {
    async fn find_by_date(
        &mut self,
        date: ForecastDate,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        Ok(first_by_date(&self.staged, date))
    }

    async fn find_by_date_and_location(
        &mut self,
        date: ForecastDate,
        location: &str,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        Ok(first_by_key(&self.staged, date, location))
    }

    async fn insert(&mut self, record: &ForecastRecord) -> Result<(), ApplicationError> {
        self.check_writable()?;
        // Yield while holding the lock so racing transactions actually queue
        tokio::task::yield_now().await;
        insert_unique(&mut self.staged, record)
    }

    async fn update(&mut self, record: &ForecastRecord) -> Result<(), ApplicationError> {
        self.check_writable()?;
        overwrite(&mut self.staged, record)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), ApplicationError> {
        let staged = std::mem::take(&mut self.staged);
        *self.guard = staged;
        Ok(())
    }
}

#[async_trait]
impl ForecastStorePort for InMemoryForecastStore {
    async fn find_by_date(
        &self,
        date: ForecastDate,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        Ok(first_by_date(&self.records.lock().await, date))
    }

    async fn find_by_date_and_location(
        &self,
        date: ForecastDate,
        location: &str,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        Ok(first_by_key(&self.records.lock().await, date, location))
    }

    async fn insert(&self, record: &ForecastRecord) -> Result<ForecastRecord, ApplicationError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApplicationError::Persistence("disk I/O error".to_string()));
        }
        insert_unique(&mut *self.records.lock().await, record)?;
        Ok(record.clone())
    }

    async fn update(&self, record: &ForecastRecord) -> Result<(), ApplicationError> {
        overwrite(&mut self.records.lock().await, record)
    }

    async fn list_all(&self) -> Result<Vec<ForecastRecord>, ApplicationError> {
        Ok(self.records.lock().await.clone())
    }

    async fn begin(&self) -> Result<Box<dyn ForecastTransaction>, ApplicationError> {
        let guard = Arc::clone(&self.records).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            staged,
            fail_writes: self.fail_writes.load(Ordering::SeqCst),
        }))
    }

    async fn health(&self) -> Result<DatabaseHealth, ApplicationError> {
        Ok(DatabaseHealth::healthy_with_version("in-memory"))
    }
}
