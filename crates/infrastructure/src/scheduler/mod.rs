//! Task scheduler for recurring and delayed background jobs
//!
//! Recurring tasks run on a cron expression (six fields, seconds first).
//! One-shot jobs run once after a delay and are what the HTTP surface
//! queues for forecast processing.
//!
//! Uses `tokio-cron-scheduler` for both.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use application::{
    error::ApplicationError,
    ports::{JobSchedulerPort, ScheduledJob},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Invalid cron expression
    #[error("Invalid cron expression: {0}")]
    InvalidCronExpression(String),

    /// Task not found
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Scheduler is not running
    #[error("Scheduler is not running")]
    NotRunning,

    /// Internal scheduler error
    #[error("Internal scheduler error: {0}")]
    Internal(String),
}

impl From<JobSchedulerError> for SchedulerError {
    fn from(err: JobSchedulerError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<SchedulerError> for ApplicationError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::NotRunning => Self::ServiceUnavailable(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Statistics for a recurring task
#[derive(Debug, Clone)]
pub struct TaskStats {
    /// Task name
    pub name: String,
    /// Cron expression
    pub cron_expression: String,
    /// Number of successful executions
    pub success_count: u64,
    /// Number of failed executions
    pub failure_count: u64,
    /// Last execution time
    pub last_run: Option<DateTime<Utc>>,
    /// Last error message
    pub last_error: Option<String>,
}

/// Internal task metadata
struct TaskMetadata {
    name: String,
    cron_expression: String,
    job_id: Uuid,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    last_run: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

impl TaskMetadata {
    #[allow(clippy::missing_const_for_fn)] // RwLock::new is not const in parking_lot
    fn new(name: String, cron_expression: String, job_id: Uuid) -> Self {
        Self {
            name,
            cron_expression,
            job_id,
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            last_run: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    fn to_stats(&self) -> TaskStats {
        TaskStats {
            name: self.name.clone(),
            cron_expression: self.cron_expression.clone(),
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            last_run: *self.last_run.read(),
            last_error: self.last_error.read().clone(),
        }
    }

    fn record(&self, result: &Result<(), String>) {
        *self.last_run.write() = Some(Utc::now());
        match result {
            Ok(()) => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                *self.last_error.write() = Some(e.clone());
            },
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether to start the scheduler immediately
    pub auto_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

/// Predefined cron expressions for common schedules
pub mod schedules {
    /// Every minute
    pub const EVERY_MINUTE: &str = "0 * * * * *";
    /// Every hour
    pub const HOURLY: &str = "0 0 * * * *";
}

/// Log the outcome of one job run and hand it back
fn log_outcome(name: &str, job_id: Uuid, started: Instant, result: &Result<(), String>) {
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(()) => info!(task = %name, job_id = %job_id.simple(), duration_ms, "Task completed successfully"),
        Err(e) => error!(task = %name, job_id = %job_id.simple(), error = %e, duration_ms, "Task failed"),
    }
}

/// Task scheduler for background jobs
pub struct TaskScheduler {
    scheduler: AsyncMutex<JobScheduler>,
    tasks: Arc<RwLock<HashMap<String, Arc<TaskMetadata>>>>,
    running: Arc<AtomicBool>,
    one_shots_completed: Arc<AtomicU64>,
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("task_count", &self.tasks.read().len())
            .finish_non_exhaustive()
    }
}

impl TaskScheduler {
    /// Create a new task scheduler
    #[instrument(skip_all)]
    pub async fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let scheduler = JobScheduler::new().await?;

        let instance = Self {
            scheduler: AsyncMutex::new(scheduler),
            tasks: Arc::new(RwLock::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
            one_shots_completed: Arc::new(AtomicU64::new(0)),
        };

        if config.auto_start {
            instance.start().await?;
        }

        info!("Task scheduler initialized");
        Ok(instance)
    }

    /// Start the scheduler
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.running.load(Ordering::Relaxed) {
            debug!("Scheduler already running");
            return Ok(());
        }

        self.scheduler.lock().await.start().await?;
        self.running.store(true, Ordering::Relaxed);
        info!("Task scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        if !self.running.load(Ordering::Relaxed) {
            debug!("Scheduler already stopped");
            return Ok(());
        }

        self.scheduler.lock().await.shutdown().await?;
        self.running.store(false, Ordering::Relaxed);
        info!("Task scheduler stopped");
        Ok(())
    }

    /// Check if the scheduler is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Add a recurring task
    ///
    /// # Cron Format
    /// ```text
    /// ┌──────────── second (0-59)
    /// │ ┌────────── minute (0-59)
    /// │ │ ┌──────── hour (0-23)
    /// │ │ │ ┌────── day of month (1-31)
    /// │ │ │ │ ┌──── month (1-12)
    /// │ │ │ │ │ ┌── day of week (0-6, Sunday=0)
    /// │ │ │ │ │ │
    /// * * * * * *
    /// ```
    #[instrument(skip(self, task))]
    pub async fn add_task<F, Fut>(
        &self,
        name: &str,
        cron_expression: &str,
        task: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        cron_expression.parse::<cron::Schedule>().map_err(|e| {
            SchedulerError::InvalidCronExpression(format!("{cron_expression}: {e}"))
        })?;

        let name_clone = name.to_string();
        let tasks = Arc::clone(&self.tasks);

        let job = Job::new_async(cron_expression, move |job_id, _lock| {
            let name = name_clone.clone();
            let tasks = Arc::clone(&tasks);
            let task_future = task();

            Box::pin(async move {
                debug!(task = %name, "Starting scheduled task");
                let started = Instant::now();
                let result = task_future.await;
                log_outcome(&name, job_id, started, &result);
                if let Some(metadata) = tasks.read().get(&name) {
                    metadata.record(&result);
                }
            })
        })
        .map_err(|e| SchedulerError::InvalidCronExpression(e.to_string()))?;

        let job_id = job.guid();
        self.scheduler.lock().await.add(job).await?;

        let metadata = Arc::new(TaskMetadata::new(
            name.to_string(),
            cron_expression.to_string(),
            job_id,
        ));
        self.tasks.write().insert(name.to_string(), metadata);

        info!(task = %name, cron = %cron_expression, "Task scheduled");
        Ok(())
    }

    /// Run `task` once after `delay`. The task receives its job id, which is
    /// also returned.
    #[instrument(skip(self, task))]
    pub async fn add_one_shot<F, Fut>(
        &self,
        name: &str,
        delay: Duration,
        task: F,
    ) -> Result<Uuid, SchedulerError>
    where
        F: FnOnce(Uuid) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        let slot = Arc::new(Mutex::new(Some(task)));
        let name_clone = name.to_string();
        let completed = Arc::clone(&self.one_shots_completed);

        let job = Job::new_one_shot_async(delay, move |job_id, _lock| {
            let task = slot.lock().take();
            let name = name_clone.clone();
            let completed = Arc::clone(&completed);

            Box::pin(async move {
                let Some(task) = task else {
                    return;
                };
                let started = Instant::now();
                let result = task(job_id).await;
                log_outcome(&name, job_id, started, &result);
                completed.fetch_add(1, Ordering::Relaxed);
            })
        })?;

        let job_id = job.guid();
        self.scheduler.lock().await.add(job).await?;

        debug!(task = %name, job_id = %job_id.simple(), ?delay, "One-shot job scheduled");
        Ok(job_id)
    }

    /// Remove a recurring task
    #[instrument(skip(self))]
    pub async fn remove_task(&self, name: &str) -> Result<(), SchedulerError> {
        let metadata = self
            .tasks
            .write()
            .remove(name)
            .ok_or_else(|| SchedulerError::TaskNotFound(name.to_string()))?;

        self.scheduler.lock().await.remove(&metadata.job_id).await?;
        info!(task = %name, "Task removed");
        Ok(())
    }

    /// Get statistics for a recurring task
    #[must_use]
    pub fn get_task_stats(&self, name: &str) -> Option<TaskStats> {
        self.tasks.read().get(name).map(|m| m.to_stats())
    }

    /// Get the number of recurring tasks
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    /// Number of one-shot jobs that have finished, successfully or not
    #[must_use]
    pub fn one_shots_completed(&self) -> u64 {
        self.one_shots_completed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl JobSchedulerPort for TaskScheduler {
    async fn schedule_once(
        &self,
        name: &str,
        delay: Duration,
        job: ScheduledJob,
    ) -> Result<String, ApplicationError> {
        let job_id = self
            .add_one_shot(name, delay, move |id| job(id.simple().to_string()))
            .await?;
        Ok(job_id.simple().to_string())
    }
}
