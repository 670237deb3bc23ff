//! Redis Streams channel tests against a real Redis container
//!
//! These need Docker and are ignored by default:
//! `cargo test -p infrastructure --test redis_channel_tests -- --ignored`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use application::ports::ObservationChannelPort;
use infrastructure::{RedisChannelConfig, RedisObservationChannel};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;

struct RedisFixture {
    _container: ContainerAsync<Redis>,
    url: String,
}

async fn start_redis() -> RedisFixture {
    let container = Redis::default()
        .with_tag("7-alpine")
        .start()
        .await
        .expect("Failed to start Redis container");
    let host = container.get_host().await.expect("host").to_string();
    let port = container.get_host_port_ipv4(6379).await.expect("port");
    RedisFixture {
        _container: container,
        url: format!("redis://{host}:{port}"),
    }
}

fn config(claim_idle: Duration) -> RedisChannelConfig {
    RedisChannelConfig {
        stream_key: "test:observations".to_string(),
        dead_letter_key: "test:observations:dead".to_string(),
        group: "test-intake".to_string(),
        consumer: "test-consumer".to_string(),
        block: Duration::from_millis(100),
        claim_idle,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn publish_receive_ack() {
    let redis = start_redis().await;
    let channel = RedisObservationChannel::connect(&redis.url, config(Duration::from_secs(30)))
        .await
        .unwrap();

    let id = channel
        .publish("forecast.legacy", r#"{"date":"2024-01-01","temperatureC":5}"#)
        .await
        .unwrap();
    let deliveries = channel.receive(10).await.unwrap();

    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].id, id);
    assert_eq!(deliveries[0].message_type, "forecast.legacy");
    assert_eq!(deliveries[0].delivery_count, 1);

    channel.ack(&deliveries[0]).await.unwrap();
    assert!(channel.receive(10).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn connect_twice_reuses_group() {
    let redis = start_redis().await;
    RedisObservationChannel::connect(&redis.url, config(Duration::from_secs(30)))
        .await
        .unwrap();
    RedisObservationChannel::connect(&redis.url, config(Duration::from_secs(30)))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn unacknowledged_entry_is_reclaimed() {
    let redis = start_redis().await;
    let channel = RedisObservationChannel::connect(&redis.url, config(Duration::from_millis(100)))
        .await
        .unwrap();

    channel.publish("forecast.legacy", "{}").await.unwrap();
    let first = channel.receive(1).await.unwrap();
    assert_eq!(first[0].delivery_count, 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    let second = channel.receive(1).await.unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id);
    assert_eq!(second[0].delivery_count, 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn dead_letter_moves_entry() {
    let redis = start_redis().await;
    let channel = RedisObservationChannel::connect(&redis.url, config(Duration::from_millis(100)))
        .await
        .unwrap();

    channel.publish("forecast.legacy", "not json").await.unwrap();
    let delivery = channel.receive(1).await.unwrap().remove(0);
    channel
        .dead_letter(&delivery, "max deliveries exceeded")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(channel.receive(1).await.unwrap().is_empty());

    let client = redis::Client::open(redis.url.as_str()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let dead: u64 = redis::cmd("XLEN")
        .arg("test:observations:dead")
        .query_async(&mut conn)
        .await
        .unwrap();
    assert_eq!(dead, 1);
}
