//! Factory functions for recurring scheduled tasks
//!
//! Provides pre-built task closures for the scheduler to run:
//! - Forecast heartbeat (every minute by default)

use application::services::ForecastProcessor;
use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::scheduler::{SchedulerError, TaskScheduler};

/// Task name for the forecast heartbeat
pub const HEARTBEAT_TASK: &str = "forecast_heartbeat";

/// Create the heartbeat task closure
///
/// Each run counts the stored forecasts through the processor.
pub fn create_heartbeat_task(
    processor: ForecastProcessor,
) -> impl Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync + 'static {
    move || {
        let processor = processor.clone();

        Box::pin(async move {
            debug!("Running forecast heartbeat");

            match processor.heartbeat().await {
                Ok(_) => Ok(()),
                Err(e) => {
                    error!(error = %e, "Forecast heartbeat failed");
                    Err(format!("Heartbeat failed: {e}"))
                },
            }
        })
    }
}

/// Register the heartbeat on `scheduler` under [`HEARTBEAT_TASK`]
pub async fn register_heartbeat(
    scheduler: &TaskScheduler,
    processor: ForecastProcessor,
    cron_expression: &str,
) -> Result<(), SchedulerError> {
    scheduler
        .add_task(
            HEARTBEAT_TASK,
            cron_expression,
            create_heartbeat_task(processor),
        )
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use application::ports::NoopForecastMetrics;

    use super::*;
    use crate::{
        persistence::{AsyncDatabase, SqliteForecastStore},
        scheduler::{SchedulerConfig, schedules},
    };

    async fn processor() -> (AsyncDatabase, ForecastProcessor) {
        let db = AsyncDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let store = Arc::new(SqliteForecastStore::new(db.pool().clone()));
        (db, ForecastProcessor::new(store, Arc::new(NoopForecastMetrics)))
    }

    #[tokio::test]
    async fn heartbeat_succeeds_on_empty_store() {
        let (_db, processor) = processor().await;
        let task = create_heartbeat_task(processor);
        assert!(task().await.is_ok());
        assert!(task().await.is_ok());
    }

    #[tokio::test]
    async fn heartbeat_reports_store_failure() {
        let (db, processor) = processor().await;
        db.close().await;

        let task = create_heartbeat_task(processor);
        let result = task().await;

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Heartbeat failed"));
    }

    #[tokio::test]
    async fn register_heartbeat_adds_task() {
        let (_db, processor) = processor().await;
        let scheduler = TaskScheduler::new(SchedulerConfig::default())
            .await
            .unwrap();

        register_heartbeat(&scheduler, processor, schedules::EVERY_MINUTE)
            .await
            .unwrap();

        assert_eq!(scheduler.task_count(), 1);
        assert!(scheduler.get_task_stats(HEARTBEAT_TASK).is_some());
        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn register_heartbeat_rejects_bad_cron() {
        let (_db, processor) = processor().await;
        let scheduler = TaskScheduler::new(SchedulerConfig::default())
            .await
            .unwrap();

        let result = register_heartbeat(&scheduler, processor, "not a cron").await;

        assert!(matches!(
            result,
            Err(SchedulerError::InvalidCronExpression(_))
        ));
        scheduler.stop().await.unwrap();
    }
}
