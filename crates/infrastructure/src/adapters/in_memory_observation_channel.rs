//! In-process observation channel
//!
//! Used when no Redis URL is configured and in tests. Keeps the same
//! delivery contract as the stream channel: a received message is
//! redelivered until acknowledged, once the redelivery window has passed.
//! Only the most recent [`DEAD_LETTER_CAPACITY`] dead letters are kept.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use application::{
    error::ApplicationError,
    ports::{Delivery, ObservationChannelPort},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Dead letters retained before the oldest are dropped
pub const DEAD_LETTER_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Entry {
    id: String,
    message_type: String,
    payload: String,
    delivery_count: u64,
    in_flight_since: Option<Instant>,
}

impl Entry {
    fn to_delivery(&self) -> Delivery {
        Delivery::new(&self.id, &self.message_type, &self.payload)
            .with_delivery_count(self.delivery_count)
    }
}

/// A message parked on the dead-letter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub delivery: Delivery,
    pub reason: String,
}

#[derive(Debug, Default)]
struct State {
    entries: VecDeque<Entry>,
    dead_letters: VecDeque<DeadLetter>,
}

/// Observation channel held entirely in process memory
#[derive(Debug, Clone)]
pub struct InMemoryObservationChannel {
    state: Arc<Mutex<State>>,
    notify: Arc<Notify>,
    sequence: Arc<AtomicU64>,
    wait: Duration,
    redelivery_after: Duration,
}

impl Default for InMemoryObservationChannel {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), Duration::from_secs(30))
    }
}

impl InMemoryObservationChannel {
    /// Create a channel.
    ///
    /// `wait` bounds how long an empty `receive` blocks; unacknowledged
    /// messages come back after `redelivery_after`.
    #[must_use]
    pub fn new(wait: Duration, redelivery_after: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            notify: Arc::new(Notify::new()),
            sequence: Arc::new(AtomicU64::new(0)),
            wait,
            redelivery_after,
        }
    }

    /// Messages published or in flight but not yet acknowledged
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Retained dead letters, oldest first
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().dead_letters.iter().cloned().collect()
    }

    fn take_ready(&self, max: usize) -> Vec<Delivery> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let mut ready = Vec::new();

        for entry in &mut state.entries {
            if ready.len() == max {
                break;
            }
            let available = entry
                .in_flight_since
                .is_none_or(|since| now.duration_since(since) >= self.redelivery_after);
            if available {
                if entry.in_flight_since.is_some() {
                    warn!(id = %entry.id, "Redelivering unacknowledged observation");
                }
                entry.delivery_count += 1;
                entry.in_flight_since = Some(now);
                ready.push(entry.to_delivery());
            }
        }
        ready
    }

    fn remove(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);
        state.entries.len() != before
    }
}

#[async_trait]
impl ObservationChannelPort for InMemoryObservationChannel {
    async fn publish(
        &self,
        message_type: &str,
        payload: &str,
    ) -> Result<String, ApplicationError> {
        let id = format!("{}-0", self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        self.state.lock().entries.push_back(Entry {
            id: id.clone(),
            message_type: message_type.to_string(),
            payload: payload.to_string(),
            delivery_count: 0,
            in_flight_since: None,
        });
        self.notify.notify_one();
        debug!(id = %id, message_type, "Observation published");
        Ok(id)
    }

    async fn receive(&self, max: usize) -> Result<Vec<Delivery>, ApplicationError> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let ready = self.take_ready(max);
        if !ready.is_empty() {
            return Ok(ready);
        }

        let _ = tokio::time::timeout(self.wait, self.notify.notified()).await;
        Ok(self.take_ready(max))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), ApplicationError> {
        if !self.remove(&delivery.id) {
            debug!(id = %delivery.id, "Ack for unknown or already acknowledged message");
        }
        Ok(())
    }

    async fn dead_letter(
        &self,
        delivery: &Delivery,
        reason: &str,
    ) -> Result<(), ApplicationError> {
        if !self.remove(&delivery.id) {
            debug!(id = %delivery.id, "Dead-lettering unknown or already acknowledged message");
        }
        {
            let mut state = self.state.lock();
            if state.dead_letters.len() == DEAD_LETTER_CAPACITY {
                state.dead_letters.pop_front();
            }
            state.dead_letters.push_back(DeadLetter {
                delivery: delivery.clone(),
                reason: reason.to_string(),
            });
        }
        warn!(id = %delivery.id, reason = %reason, "Observation moved to dead-letter list");
        Ok(())
    }
}
