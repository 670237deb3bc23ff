//! Job scheduler port
//!
//! Runs one-shot background jobs after a delay. The job receives the id the
//! scheduler assigned to it, the same id `schedule_once` returns.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ApplicationError;

/// A job body: takes its own job id, reports failure as a message
pub type ScheduledJob = Box<dyn FnOnce(String) -> BoxFuture<'static, Result<(), String>> + Send>;

/// Port for delayed background jobs
#[async_trait]
pub trait JobSchedulerPort: Send + Sync {
    /// Run `job` once after `delay` and return its job id
    async fn schedule_once(
        &self,
        name: &str,
        delay: Duration,
        job: ScheduledJob,
    ) -> Result<String, ApplicationError>;
}
