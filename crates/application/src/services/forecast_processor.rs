//! Forecast processor - background jobs over the stored forecasts
//!
//! Jobs are queued through the [`JobSchedulerPort`] and run after a short
//! delay. Each run summarizes the table and logs the result.

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use domain::ForecastRecord;
use tracing::{info, instrument};

use crate::{
    error::ApplicationError,
    ports::{ForecastMetricsPort, ForecastStorePort, JobSchedulerPort},
};

/// Delay before a queued job runs
pub const DEFAULT_JOB_DELAY: Duration = Duration::from_secs(1);

/// Which background job to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingJob {
    /// Summarize every forecast
    All,
    /// Summarize forecasts per location
    ByLocation,
}

impl ProcessingJob {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::All => "forecast-process",
            Self::ByLocation => "forecast-process-by-location",
        }
    }
}

/// Temperature summary over a set of forecasts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastStats {
    pub count: usize,
    pub min_temperature_c: Option<i32>,
    pub max_temperature_c: Option<i32>,
    pub mean_temperature_c: Option<f64>,
}

impl ForecastStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ForecastRecord>) -> Self {
        let temps: Vec<i32> = records.into_iter().map(|r| r.temperature_c).collect();
        if temps.is_empty() {
            return Self::default();
        }
        let sum: i64 = temps.iter().map(|t| i64::from(*t)).sum();
        Self {
            count: temps.len(),
            min_temperature_c: temps.iter().min().copied(),
            max_temperature_c: temps.iter().max().copied(),
            mean_temperature_c: Some(sum as f64 / temps.len() as f64),
        }
    }
}

/// Stats for one location; `None` groups records without a location
#[derive(Debug, Clone, PartialEq)]
pub struct LocationStats {
    pub location: Option<String>,
    pub stats: ForecastStats,
}

/// Runs and queues the forecast background jobs
#[derive(Clone)]
pub struct ForecastProcessor {
    store: Arc<dyn ForecastStorePort>,
    metrics: Arc<dyn ForecastMetricsPort>,
    scheduler: Option<Arc<dyn JobSchedulerPort>>,
    delay: Duration,
}

impl fmt::Debug for ForecastProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastProcessor")
            .field("has_scheduler", &self.scheduler.is_some())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ForecastProcessor {
    #[must_use]
    pub fn new(store: Arc<dyn ForecastStorePort>, metrics: Arc<dyn ForecastMetricsPort>) -> Self {
        Self {
            store,
            metrics,
            scheduler: None,
            delay: DEFAULT_JOB_DELAY,
        }
    }

    /// Enable queueing through a scheduler
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn JobSchedulerPort>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Whether jobs can be queued
    #[must_use]
    pub fn can_enqueue(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Queue `job` to run after the configured delay and return its id.
    ///
    /// # Errors
    ///
    /// `ApplicationError::ServiceUnavailable` when no scheduler is configured.
    #[instrument(skip(self))]
    pub async fn enqueue(&self, job: ProcessingJob) -> Result<String, ApplicationError> {
        let scheduler = self.scheduler.as_ref().ok_or_else(|| {
            ApplicationError::ServiceUnavailable("job scheduler is disabled".to_string())
        })?;

        let processor = self.clone();
        let job_id = scheduler
            .schedule_once(
                job.name(),
                self.delay,
                Box::new(move |job_id| {
                    Box::pin(async move {
                        processor.run(job, &job_id).await.map_err(|e| e.to_string())
                    })
                }),
            )
            .await?;

        info!(job = job.name(), job_id = %job_id, "Job enqueued");
        Ok(job_id)
    }

    /// Run `job` now
    pub async fn run(&self, job: ProcessingJob, job_id: &str) -> Result<(), ApplicationError> {
        match job {
            ProcessingJob::All => {
                self.process(job_id).await?;
            },
            ProcessingJob::ByLocation => {
                self.process_by_location(job_id).await?;
            },
        }
        self.metrics.job_completed(job.name());
        Ok(())
    }

    /// Summarize every stored forecast
    #[instrument(skip(self))]
    pub async fn process(&self, job_id: &str) -> Result<ForecastStats, ApplicationError> {
        let records = self.store.list_all().await?;
        let stats = ForecastStats::from_records(&records);
        info!(
            count = stats.count,
            min = ?stats.min_temperature_c,
            max = ?stats.max_temperature_c,
            mean = ?stats.mean_temperature_c,
            "Processed forecasts"
        );
        Ok(stats)
    }

    /// Summarize stored forecasts per location, ordered by location
    #[instrument(skip(self))]
    pub async fn process_by_location(
        &self,
        job_id: &str,
    ) -> Result<Vec<LocationStats>, ApplicationError> {
        let records = self.store.list_all().await?;

        let mut groups: BTreeMap<Option<&str>, Vec<&ForecastRecord>> = BTreeMap::new();
        for record in &records {
            groups
                .entry(record.location.as_deref())
                .or_default()
                .push(record);
        }

        let summary: Vec<LocationStats> = groups
            .into_iter()
            .map(|(location, group)| LocationStats {
                location: location.map(str::to_string),
                stats: ForecastStats::from_records(group),
            })
            .collect();

        for entry in &summary {
            info!(
                location = entry.location.as_deref().unwrap_or("-"),
                count = entry.stats.count,
                mean = ?entry.stats.mean_temperature_c,
                "Processed forecasts for location"
            );
        }
        Ok(summary)
    }

    /// Recurring liveness job; logs how many forecasts are stored
    pub async fn heartbeat(&self) -> Result<usize, ApplicationError> {
        let count = self.store.list_all().await?.len();
        info!(count, "Hello from the forecast scheduler");
        self.metrics.job_completed("heartbeat");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use domain::ForecastDate;

    use super::*;
    use crate::{
        ports::{MockForecastMetricsPort, NoopForecastMetrics, ScheduledJob},
        services::test_support::InMemoryForecastStore,
    };

    type Call = (String, Duration, Result<(), String>);

    /// Runs the job inline and remembers what it was asked to schedule
    #[derive(Debug, Default)]
    struct Recorded {
        calls: Mutex<Vec<Call>>,
    }

    #[async_trait]
    impl JobSchedulerPort for Recorded {
        async fn schedule_once(
            &self,
            name: &str,
            delay: Duration,
            job: ScheduledJob,
        ) -> Result<String, ApplicationError> {
            let result = job("job-1".to_string()).await;
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), delay, result));
            Ok("job-1".to_string())
        }
    }

    async fn seeded_store() -> InMemoryForecastStore {
        let store = InMemoryForecastStore::new();
        let date = ForecastDate::from_ymd(2024, 1, 1).unwrap();
        let next = ForecastDate::from_ymd(2024, 1, 2).unwrap();
        for record in [
            ForecastRecord::new(date, -4, None),
            ForecastRecord::new(date, 10, None).with_location("Oslo"),
            ForecastRecord::new(next, 20, None).with_location("Oslo"),
            ForecastRecord::new(date, 30, None).with_location("Cairo"),
        ] {
            store.insert(&record).await.unwrap();
        }
        store
    }

    fn processor(store: InMemoryForecastStore) -> ForecastProcessor {
        ForecastProcessor::new(Arc::new(store), Arc::new(NoopForecastMetrics))
    }

    #[test]
    fn stats_of_nothing_are_empty() {
        assert_eq!(ForecastStats::from_records(&Vec::<ForecastRecord>::new()), ForecastStats::default());
    }

    #[tokio::test]
    async fn process_summarizes_all_records() {
        let stats = processor(seeded_store().await).process("job-1").await.unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min_temperature_c, Some(-4));
        assert_eq!(stats.max_temperature_c, Some(30));
        assert_eq!(stats.mean_temperature_c, Some(14.0));
    }

    #[tokio::test]
    async fn process_by_location_groups_records() {
        let summary = processor(seeded_store().await)
            .process_by_location("job-1")
            .await
            .unwrap();

        let locations: Vec<_> = summary.iter().map(|s| s.location.as_deref()).collect();
        assert_eq!(locations, vec![None, Some("Cairo"), Some("Oslo")]);
        assert_eq!(summary[2].stats.count, 2);
        assert_eq!(summary[2].stats.mean_temperature_c, Some(15.0));
    }

    #[tokio::test]
    async fn enqueue_without_scheduler_is_unavailable() {
        let processor = processor(InMemoryForecastStore::new());
        assert!(!processor.can_enqueue());
        let err = processor.enqueue(ProcessingJob::All).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn enqueue_schedules_delayed_job() {
        let scheduler = Arc::new(Recorded::default());
        let mut metrics = MockForecastMetricsPort::new();
        metrics
            .expect_job_completed()
            .withf(|job| job == "forecast-process-by-location")
            .times(1)
            .return_const(());

        let processor = ForecastProcessor::new(
            Arc::new(seeded_store().await),
            Arc::new(metrics),
        )
        .with_scheduler(Arc::clone(&scheduler) as Arc<dyn JobSchedulerPort>)
        .with_delay(Duration::from_millis(5));

        let id = processor.enqueue(ProcessingJob::ByLocation).await.unwrap();

        assert_eq!(id, "job-1");
        let calls = scheduler.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "forecast-process-by-location");
        assert_eq!(calls[0].1, Duration::from_millis(5));
        assert_eq!(calls[0].2, Ok(()));
    }

    #[tokio::test]
    async fn heartbeat_counts_records() {
        let count = processor(seeded_store().await).heartbeat().await.unwrap();
        assert_eq!(count, 4);
    }
}
