//! SQLite forecast store using sqlx
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339. The
//! `(date, location)` key is enforced by two partial unique indexes, one for
//! located rows and one for rows without a location.

use std::time::Instant;

use application::{
    error::ApplicationError,
    ports::{DatabaseHealth, ForecastStorePort, ForecastTransaction},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{ForecastDate, ForecastId, ForecastRecord};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use tracing::{debug, instrument, warn};

use super::error::map_sqlx_error;

const SELECT_COLUMNS: &str =
    "SELECT id, date, temperature_c, summary, location, created_at, updated_at FROM forecasts";

/// Takes the database write lock at the start of a transaction so concurrent
/// reconciles queue on the busy timeout instead of racing on a stale read.
const ACQUIRE_WRITE_LOCK: &str = "UPDATE forecasts SET id = id WHERE 0";

/// SQLite forecast store
#[derive(Debug, Clone)]
pub struct SqliteForecastStore {
    pool: SqlitePool,
}

impl SqliteForecastStore {
    /// Create a new forecast store on an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForecastStorePort for SqliteForecastStore {
    #[instrument(skip(self), fields(date = %date))]
    async fn find_by_date(
        &self,
        date: ForecastDate,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        select_by_date(&self.pool, date).await
    }

    #[instrument(skip(self), fields(date = %date))]
    async fn find_by_date_and_location(
        &self,
        date: ForecastDate,
        location: &str,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        select_by_date_and_location(&self.pool, date, location).await
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn insert(&self, record: &ForecastRecord) -> Result<ForecastRecord, ApplicationError> {
        insert_record(&self.pool, record).await?;
        Ok(record.clone())
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: &ForecastRecord) -> Result<(), ApplicationError> {
        update_record(&self.pool, record).await
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<ForecastRecord>, ApplicationError> {
        let rows: Vec<ForecastRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY date ASC, location ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter().map(ForecastRow::into_record).collect()
    }

    async fn begin(&self) -> Result<Box<dyn ForecastTransaction>, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query(ACQUIRE_WRITE_LOCK)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteForecastTransaction { tx }))
    }

    #[instrument(skip(self))]
    async fn health(&self) -> Result<DatabaseHealth, ApplicationError> {
        let start = Instant::now();
        match sqlx::query_scalar::<_, String>("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await
        {
            Ok(version) => {
                let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                debug!(elapsed_ms = elapsed, "Database health check passed");
                Ok(DatabaseHealth::healthy_with_version(format!("SQLite {version}"))
                    .with_pool_size(self.pool.size())
                    .with_response_time(elapsed))
            },
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                Ok(DatabaseHealth::unhealthy())
            },
        }
    }
}

/// One reconcile transaction, holding the write lock until commit or drop
struct SqliteForecastTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ForecastTransaction for SqliteForecastTransaction {
    async fn find_by_date(
        &mut self,
        date: ForecastDate,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        select_by_date(&mut *self.tx, date).await
    }

    async fn find_by_date_and_location(
        &mut self,
        date: ForecastDate,
        location: &str,
    ) -> Result<Option<ForecastRecord>, ApplicationError> {
        select_by_date_and_location(&mut *self.tx, date, location).await
    }

    async fn insert(&mut self, record: &ForecastRecord) -> Result<(), ApplicationError> {
        insert_record(&mut *self.tx, record).await
    }

    async fn update(&mut self, record: &ForecastRecord) -> Result<(), ApplicationError> {
        update_record(&mut *self.tx, record).await
    }

    async fn commit(self: Box<Self>) -> Result<(), ApplicationError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}

async fn select_by_date<'e, E>(
    executor: E,
    date: ForecastDate,
) -> Result<Option<ForecastRecord>, ApplicationError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<ForecastRow> = sqlx::query_as(&format!(
        "{SELECT_COLUMNS} WHERE date = $1 ORDER BY created_at ASC, rowid ASC LIMIT 1"
    ))
    .bind(date.to_string())
    .fetch_optional(executor)
    .await
    .map_err(map_sqlx_error)?;

    row.map(ForecastRow::into_record).transpose()
}

async fn select_by_date_and_location<'e, E>(
    executor: E,
    date: ForecastDate,
    location: &str,
) -> Result<Option<ForecastRecord>, ApplicationError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<ForecastRow> = sqlx::query_as(&format!(
        "{SELECT_COLUMNS} WHERE date = $1 AND location = $2"
    ))
    .bind(date.to_string())
    .bind(location)
    .fetch_optional(executor)
    .await
    .map_err(map_sqlx_error)?;

    row.map(ForecastRow::into_record).transpose()
}

async fn insert_record<'e, E>(executor: E, record: &ForecastRecord) -> Result<(), ApplicationError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO forecasts (id, date, temperature_c, summary, location, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(record.id.to_string())
    .bind(record.date.to_string())
    .bind(record.temperature_c)
    .bind(&record.summary)
    .bind(&record.location)
    .bind(record.created_at.to_rfc3339())
    .bind(record.updated_at.to_rfc3339())
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    debug!(id = %record.id, "Forecast inserted");
    Ok(())
}

async fn update_record<'e, E>(executor: E, record: &ForecastRecord) -> Result<(), ApplicationError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r"
        UPDATE forecasts
        SET temperature_c = $1, summary = $2, updated_at = $3
        WHERE id = $4
        ",
    )
    .bind(record.temperature_c)
    .bind(&record.summary)
    .bind(record.updated_at.to_rfc3339())
    .bind(record.id.to_string())
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(ApplicationError::NotFound(format!("forecast {}", record.id)));
    }
    debug!(id = %record.id, "Forecast updated");
    Ok(())
}

/// Row type for forecast queries
#[derive(sqlx::FromRow)]
struct ForecastRow {
    id: String,
    date: String,
    temperature_c: i32,
    summary: Option<String>,
    location: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ForecastRow {
    fn into_record(self) -> Result<ForecastRecord, ApplicationError> {
        let id = ForecastId::parse(&self.id)
            .map_err(|e| ApplicationError::Internal(format!("Invalid forecast ID: {e}")))?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map(ForecastDate::from_naive)
            .map_err(|e| ApplicationError::Internal(format!("Invalid forecast date: {e}")))?;

        Ok(ForecastRecord {
            id,
            date,
            temperature_c: self.temperature_c,
            summary: self.summary,
            location: self.location,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApplicationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApplicationError::Internal(format!("Invalid datetime: {e}")))
}
