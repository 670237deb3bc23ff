//! Redis Streams observation channel
//!
//! Observations are appended to one stream and read through a consumer
//! group. A delivery stays in the group's pending list until it is
//! acknowledged; entries idle for longer than the redelivery window are
//! claimed back by the next `receive`.

use std::time::Duration;

use application::{
    error::ApplicationError,
    ports::{Delivery, ObservationChannelPort},
};
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, RedisError,
    aio::MultiplexedConnection,
    streams::{StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadOptions, StreamReadReply},
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::QueueConfig;

const FIELD_MESSAGE_ID: &str = "message_id";
const FIELD_TYPE: &str = "type";
const FIELD_DATA: &str = "data";

/// Errors raised by the Redis channel
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Stream entry {id} is missing field '{field}'")]
    MissingField { id: String, field: &'static str },
}

impl From<ChannelError> for ApplicationError {
    fn from(err: ChannelError) -> Self {
        Self::Messaging(err.to_string())
    }
}

/// Stream names and timings for the Redis channel
#[derive(Debug, Clone)]
pub struct RedisChannelConfig {
    pub stream_key: String,
    pub dead_letter_key: String,
    pub group: String,
    pub consumer: String,
    /// Longest a `receive` waits for new entries
    pub block: Duration,
    /// Pending entries idle this long are claimed for redelivery
    pub claim_idle: Duration,
}

impl From<&QueueConfig> for RedisChannelConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            stream_key: config.stream_key.clone(),
            dead_letter_key: config.dead_letter_key.clone(),
            group: config.consumer_group.clone(),
            consumer: config.consumer_name.clone(),
            block: Duration::from_millis(config.block_ms),
            claim_idle: Duration::from_millis(config.redelivery_after_ms),
        }
    }
}

/// Observation channel backed by a Redis stream and consumer group
#[derive(Clone)]
pub struct RedisObservationChannel {
    // Blocking reads would stall every other command pipelined on the same
    // connection, so reads get their own.
    reader: MultiplexedConnection,
    writer: MultiplexedConnection,
    config: RedisChannelConfig,
}

impl std::fmt::Debug for RedisObservationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisObservationChannel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisObservationChannel {
    /// Connect and make sure the stream and consumer group exist
    #[instrument(skip(config), fields(stream = %config.stream_key, group = %config.group))]
    pub async fn connect(redis_url: &str, config: RedisChannelConfig) -> Result<Self, ChannelError> {
        let client = Client::open(redis_url)?;
        let mut writer = client.get_multiplexed_async_connection().await?;
        let reader = client.get_multiplexed_async_connection().await?;

        let created: Result<(), RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&config.stream_key)
            .arg(&config.group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut writer)
            .await;

        match created {
            Ok(()) => info!("Consumer group created"),
            Err(e) if e.code() == Some("BUSYGROUP") => debug!("Consumer group already exists"),
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            reader,
            writer,
            config,
        })
    }

    /// Claim pending entries that sat unacknowledged past the idle window
    async fn reclaim(&self, max: usize) -> Result<Vec<Delivery>, ChannelError> {
        let mut conn = self.writer.clone();
        let pending: StreamPendingCountReply = conn
            .xpending_count(&self.config.stream_key, &self.config.group, "-", "+", max)
            .await?;

        let idle_ms = usize::try_from(self.config.claim_idle.as_millis()).unwrap_or(usize::MAX);
        let stale: Vec<_> = pending
            .ids
            .into_iter()
            .filter(|p| p.last_delivered_ms >= idle_ms)
            .collect();
        if stale.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = stale.iter().map(|p| p.id.as_str()).collect();
        let claimed: StreamClaimReply = conn
            .xclaim(
                &self.config.stream_key,
                &self.config.group,
                &self.config.consumer,
                idle_ms,
                &ids,
            )
            .await?;

        let mut deliveries = Vec::with_capacity(claimed.ids.len());
        for entry in &claimed.ids {
            let previous = stale
                .iter()
                .find(|p| p.id == entry.id)
                .map_or(0, |p| u64::try_from(p.times_delivered).unwrap_or(u64::MAX));
            let delivery = to_delivery(entry)?.with_delivery_count(previous + 1);
            warn!(
                id = %delivery.id,
                delivery_count = delivery.delivery_count,
                "Redelivering unacknowledged observation"
            );
            deliveries.push(delivery);
        }
        Ok(deliveries)
    }

    async fn read_new(&self, max: usize, block: bool) -> Result<Vec<Delivery>, ChannelError> {
        let mut opts = StreamReadOptions::default()
            .group(&self.config.group, &self.config.consumer)
            .count(max);
        if block {
            let block_ms = usize::try_from(self.config.block.as_millis()).unwrap_or(usize::MAX);
            opts = opts.block(block_ms);
        }

        let mut conn = self.reader.clone();
        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.config.stream_key], &[">"], &opts)
            .await?;

        reply
            .into_iter()
            .flat_map(|r| r.keys)
            .flat_map(|k| k.ids)
            .map(|entry| to_delivery(&entry))
            .collect()
    }
}

fn field(entry: &StreamId, name: &'static str) -> Result<String, ChannelError> {
    entry.get(name).ok_or_else(|| ChannelError::MissingField {
        id: entry.id.clone(),
        field: name,
    })
}

fn to_delivery(entry: &StreamId) -> Result<Delivery, ChannelError> {
    Ok(Delivery::new(
        entry.id.clone(),
        field(entry, FIELD_TYPE)?,
        field(entry, FIELD_DATA)?,
    ))
}

#[async_trait]
impl ObservationChannelPort for RedisObservationChannel {
    #[instrument(skip(self, payload))]
    async fn publish(
        &self,
        message_type: &str,
        payload: &str,
    ) -> Result<String, ApplicationError> {
        let message_id = Uuid::new_v4().to_string();
        let mut conn = self.writer.clone();
        let entry_id: String = conn
            .xadd(
                &self.config.stream_key,
                "*",
                &[
                    (FIELD_MESSAGE_ID, message_id.as_str()),
                    (FIELD_TYPE, message_type),
                    (FIELD_DATA, payload),
                ],
            )
            .await
            .map_err(ChannelError::from)?;

        debug!(entry_id = %entry_id, message_id = %message_id, "Observation published");
        Ok(entry_id)
    }

    async fn receive(&self, max: usize) -> Result<Vec<Delivery>, ApplicationError> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let mut deliveries = self.reclaim(max).await?;
        let remaining = max - deliveries.len();
        if remaining > 0 {
            let fresh = self.read_new(remaining, deliveries.is_empty()).await?;
            deliveries.extend(fresh);
        }
        Ok(deliveries)
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), ApplicationError> {
        let mut conn = self.writer.clone();
        let _: u64 = conn
            .xack(&self.config.stream_key, &self.config.group, &[&delivery.id])
            .await
            .map_err(ChannelError::from)?;
        Ok(())
    }

    #[instrument(skip(self, delivery), fields(id = %delivery.id))]
    async fn dead_letter(
        &self,
        delivery: &Delivery,
        reason: &str,
    ) -> Result<(), ApplicationError> {
        let mut conn = self.writer.clone();
        let count = delivery.delivery_count.to_string();
        let _: String = conn
            .xadd(
                &self.config.dead_letter_key,
                "*",
                &[
                    ("original_id", delivery.id.as_str()),
                    (FIELD_TYPE, delivery.message_type.as_str()),
                    (FIELD_DATA, delivery.payload.as_str()),
                    ("delivery_count", count.as_str()),
                    ("reason", reason),
                ],
            )
            .await
            .map_err(ChannelError::from)?;

        self.ack(delivery).await?;
        warn!(reason = %reason, "Observation moved to dead-letter stream");
        Ok(())
    }
}
