//! Integration tests for HTTP handlers
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use application::{
    ports::{ForecastMetricsPort, ForecastStorePort, NoopForecastMetrics},
    services::{ForecastProcessor, ForecastPublisher, ForecastService},
};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use domain::{ForecastDate, ForecastRecord, ObservationVariant};
use infrastructure::{
    AppConfig, AsyncDatabase, InMemoryObservationChannel, PrometheusForecastMetrics,
    SchedulerConfig, SqliteForecastStore, TaskScheduler,
};
use presentation_http::{
    handlers::forecasts::ForecastResponse, routes::create_router, state::AppState,
};
use serde_json::{Value, json};

struct TestApp {
    server: TestServer,
    store: Arc<SqliteForecastStore>,
    channel: Arc<InMemoryObservationChannel>,
    metrics: Arc<PrometheusForecastMetrics>,
    _db: AsyncDatabase,
}

#[derive(Default)]
struct Options {
    scheduler: bool,
    metrics_disabled: bool,
}

async fn spawn_app(options: Options) -> TestApp {
    let db = AsyncDatabase::in_memory()
        .await
        .expect("Failed to open database");
    db.migrate().await.expect("Failed to migrate");

    let store = Arc::new(SqliteForecastStore::new(db.pool().clone()));
    let channel = Arc::new(InMemoryObservationChannel::default());
    let metrics = Arc::new(PrometheusForecastMetrics::new());
    let metrics_port: Arc<dyn ForecastMetricsPort> = Arc::new(NoopForecastMetrics);

    let mut processor = ForecastProcessor::new(store.clone(), metrics_port)
        .with_delay(Duration::from_millis(10));
    if options.scheduler {
        let scheduler = TaskScheduler::new(SchedulerConfig::default())
            .await
            .expect("Failed to start scheduler");
        processor = processor.with_scheduler(Arc::new(scheduler));
    }

    let state = AppState {
        forecast_service: Arc::new(ForecastService::new(store.clone())),
        publisher: Arc::new(ForecastPublisher::new(channel.clone())),
        processor: Arc::new(processor),
        store: store.clone(),
        metrics: (!options.metrics_disabled).then(|| metrics.clone()),
        config: Arc::new(AppConfig::default()),
    };

    let server = TestServer::new(create_router(state)).expect("Failed to create test server");
    TestApp {
        server,
        store,
        channel,
        metrics,
        _db: db,
    }
}

async fn seed(store: &SqliteForecastStore, date: (i32, u32, u32), temp: i32, location: Option<&str>) {
    let mut record = ForecastRecord::new(
        ForecastDate::from_ymd(date.0, date.1, date.2).unwrap(),
        temp,
        Some("Mild".to_string()),
    );
    if let Some(location) = location {
        record = record.with_location(location);
    }
    store.insert(&record).await.unwrap();
}

#[tokio::test]
async fn list_is_empty_initially() {
    let app = spawn_app(Options::default()).await;

    let response = app.server.get("/forecasts").await;

    response.assert_status_ok();
    let body: Vec<ForecastResponse> = response.json();
    assert!(body.is_empty());
}

#[tokio::test]
async fn list_returns_stored_forecasts() {
    let app = spawn_app(Options::default()).await;
    seed(&app.store, (2024, 1, 1), 5, None).await;
    seed(&app.store, (2024, 1, 1), 12, Some("Paris")).await;

    let response = app.server.get("/forecasts").await;

    response.assert_status_ok();
    let body: Vec<ForecastResponse> = response.json();
    assert_eq!(body.len(), 2);
}

#[tokio::test]
async fn list_saturates_fahrenheit_for_extreme_readings() {
    let app = spawn_app(Options::default()).await;
    seed(&app.store, (2024, 1, 1), i32::MAX, None).await;
    seed(&app.store, (2024, 1, 2), i32::MIN, None).await;

    let response = app.server.get("/forecasts").await;

    response.assert_status_ok();
    let body: Vec<ForecastResponse> = response.json();
    let fahrenheit: Vec<i32> = body.iter().map(|f| f.temperature_f).collect();
    assert_eq!(fahrenheit, [i32::MAX, i32::MIN]);
}

#[tokio::test]
async fn get_by_date_returns_unlocated_forecast() {
    let app = spawn_app(Options::default()).await;
    seed(&app.store, (2024, 3, 10), 0, None).await;

    let response = app.server.get("/forecasts/2024-03-10").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["date"], "2024-03-10T00:00:00Z");
    assert_eq!(body["temperatureC"], 0);
    assert_eq!(body["temperatureF"], 32);
    assert!(body["location"].is_null());
}

#[tokio::test]
async fn get_by_date_and_location() {
    let app = spawn_app(Options::default()).await;
    seed(&app.store, (2024, 3, 10), 20, Some("Oslo")).await;

    let response = app
        .server
        .get("/forecasts/2024-03-10")
        .add_query_param("location", "Oslo")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["location"], "Oslo");
    assert_eq!(body["temperatureC"], 20);
}

#[tokio::test]
async fn get_missing_forecast_is_not_found() {
    let app = spawn_app(Options::default()).await;
    seed(&app.store, (2024, 3, 10), 20, Some("Oslo")).await;

    let response = app
        .server
        .get("/forecasts/2024-03-10")
        .add_query_param("location", "Lima")
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn get_with_unparseable_date_is_bad_request() {
    let app = spawn_app(Options::default()).await;

    let response = app.server.get("/forecasts/not-a-date").await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn create_stores_and_returns_forecast() {
    let app = spawn_app(Options::default()).await;

    let response = app
        .server
        .post("/forecast")
        .json(&json!({
            "date": "2024-05-01T14:30:00Z",
            "temperatureC": 25,
            "summary": "Warm",
            "location": "Rome"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["date"], "2024-05-01T00:00:00Z");
    assert_eq!(body["summary"], "Warm");
    assert_eq!(body["temperatureF"], 76);

    let stored = app.store.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].location.as_deref(), Some("Rome"));
}

#[tokio::test]
async fn create_duplicate_key_fails() {
    let app = spawn_app(Options::default()).await;
    let body = json!({ "date": "2024-05-01", "temperatureC": 25, "location": "Rome" });

    app.server.post("/forecast").json(&body).await.assert_status_ok();
    let response = app.server.post("/forecast").json(&body).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "internal_error");
    assert_eq!(app.store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_rejects_blank_location() {
    let app = spawn_app(Options::default()).await;

    let response = app
        .server
        .post("/forecast")
        .json(&json!({ "date": "2024-05-01", "temperatureC": 25, "location": "" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
    assert!(app.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_rejects_bad_date() {
    let app = spawn_app(Options::default()).await;

    let response = app
        .server
        .post("/forecast")
        .json(&json!({ "date": "yesterday", "temperatureC": 1 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn publish_random_puts_one_message_on_channel() {
    let app = spawn_app(Options::default()).await;

    let response = app.server.post("/forecast/publish-random").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "Published");
    assert_eq!(app.channel.pending_len(), 1);
    assert!(app.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn process_without_scheduler_is_unavailable() {
    let app = spawn_app(Options::default()).await;

    app.server
        .post("/forecast/process")
        .await
        .assert_status_service_unavailable();
    app.server
        .post("/forecast/process2")
        .await
        .assert_status_service_unavailable();
}

#[tokio::test]
async fn process_returns_job_id() {
    let app = spawn_app(Options {
        scheduler: true,
        ..Options::default()
    })
    .await;

    for path in ["/forecast/process", "/forecast/process2"] {
        let response = app.server.post(path).await;

        response.assert_status_ok();
        let text = response.text();
        let job_id = text
            .strip_prefix("Enqueued ")
            .expect("response names the job");
        assert_eq!(job_id.len(), 32);
        assert!(job_id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = spawn_app(Options::default()).await;
    app.metrics.observation_received(ObservationVariant::Extended);

    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    assert!(response.text().contains("api_forecast_processing"));
}

#[tokio::test]
async fn metrics_endpoint_is_absent_when_disabled() {
    let app = spawn_app(Options {
        metrics_disabled: true,
        ..Options::default()
    })
    .await;

    app.server.get("/metrics").await.assert_status_not_found();
}

#[tokio::test]
async fn health_and_readiness() {
    let app = spawn_app(Options::default()).await;

    let health = app.server.get("/health").await;
    health.assert_status_ok();
    let body: Value = health.json();
    assert_eq!(body["status"], "ok");

    let ready = app.server.get("/ready").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"]["healthy"], true);
    assert_eq!(body["scheduler"], false);
}

#[tokio::test]
async fn root_redirects_to_swagger_ui() {
    let app = spawn_app(Options::default()).await;

    let response = app.server.get("/").await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "/swagger-ui/");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = spawn_app(Options::default()).await;

    let response = app.server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/forecasts/{date}"].is_object());
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = spawn_app(Options::default()).await;

    let response = app
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-7"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "req-7");
}
