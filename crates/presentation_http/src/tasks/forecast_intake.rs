//! Observation intake task
//!
//! Polls the message channel and reconciles every delivery until shutdown
//! is signalled.

use std::{sync::Arc, time::Duration};

use application::services::ForecastIntakeService;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Pause after a failed poll before trying the channel again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Spawn the intake loop.
///
/// Each iteration receives up to `batch_size` deliveries. The loop ends
/// once `shutdown` turns `true` or its sender is dropped. A batch cut off
/// by shutdown stays unacknowledged and is redelivered by the channel.
pub fn spawn_forecast_intake_task(
    intake: Arc<ForecastIntakeService>,
    batch_size: usize,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    info!(batch_size, "Starting forecast intake task");

    tokio::spawn(async move {
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
                result = intake.poll_once(batch_size) => match result {
                    Ok(report) if report.received > 0 => {
                        info!(
                            received = report.received,
                            reconciled = report.reconciled,
                            failed = report.failed,
                            dead_lettered = report.dead_lettered,
                            "Processed observation batch"
                        );
                    },
                    Ok(_) => debug!("No observations received"),
                    Err(e) => {
                        error!(error = %e, "Failed to receive observations");
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    },
                },
            }
        }
        info!("Forecast intake task stopped");
    })
}
