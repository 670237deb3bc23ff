//! Observation channel port
//!
//! The message channel that carries forecast observations from publishers to
//! the intake consumer. Adapters must redeliver anything that was received
//! but never acknowledged.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// A message handed to a consumer, pending acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Channel-assigned id, used to acknowledge the message
    pub id: String,
    /// Routing type, e.g. `forecast.extended`
    pub message_type: String,
    /// JSON body
    pub payload: String,
    /// How many times this message has been handed out, including this one
    pub delivery_count: u64,
}

impl Delivery {
    /// Create a first-time delivery
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        message_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            message_type: message_type.into(),
            payload: payload.into(),
            delivery_count: 1,
        }
    }

    #[must_use]
    pub const fn with_delivery_count(mut self, count: u64) -> Self {
        self.delivery_count = count;
        self
    }
}

/// Port for the observation message channel
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObservationChannelPort: Send + Sync {
    /// Publish one message and return its channel id
    async fn publish(&self, message_type: &str, payload: &str)
    -> Result<String, ApplicationError>;

    /// Receive up to `max` messages, waiting briefly if none are ready.
    ///
    /// Includes messages that were handed out earlier and never acknowledged.
    async fn receive(&self, max: usize) -> Result<Vec<Delivery>, ApplicationError>;

    /// Acknowledge a delivery so it is never redelivered
    async fn ack(&self, delivery: &Delivery) -> Result<(), ApplicationError>;

    /// Park a delivery on the dead-letter stream and acknowledge it
    async fn dead_letter(&self, delivery: &Delivery, reason: &str)
    -> Result<(), ApplicationError>;
}
