//! Forecast handlers
//!
//! Listing, lookup, direct insert, random publish and processing job
//! endpoints.

use application::services::{NewForecast, ProcessingJob};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::SecondsFormat;
use domain::{ForecastDate, ForecastRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{error::ApiError, middleware::ValidatedJson, state::AppState};

/// A stored forecast
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "01900000-0000-7000-8000-000000000000",
    "date": "2024-01-01T00:00:00Z",
    "temperatureC": 5,
    "temperatureF": 40,
    "summary": "Cool",
    "location": "Paris",
    "createdAt": "2024-01-01T08:00:00Z",
    "updatedAt": "2024-01-01T08:00:00Z"
}))]
pub struct ForecastResponse {
    pub id: String,
    /// Calendar day as its UTC midnight
    pub date: String,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ForecastRecord> for ForecastResponse {
    fn from(record: ForecastRecord) -> Self {
        Self {
            id: record.id.to_string(),
            date: record
                .date
                .start_of_day_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            temperature_c: record.temperature_c,
            temperature_f: record.temperature_f(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
            summary: record.summary,
            location: record.location,
        }
    }
}

/// Body for a direct insert
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "date": "2024-01-01",
    "temperatureC": 5,
    "summary": "Cool",
    "location": "Paris"
}))]
pub struct CreateForecastRequest {
    /// Date or timestamp; only the calendar day is kept
    #[validate(length(min = 1, message = "must not be empty"))]
    pub date: String,
    pub temperature_c: i32,
    #[validate(length(max = 64, message = "must be at most 64 characters"))]
    pub summary: Option<String>,
    #[validate(length(min = 1, max = 128, message = "must be between 1 and 128 characters"))]
    pub location: Option<String>,
}

/// Optional location filter for a lookup
#[derive(Debug, Deserialize, IntoParams)]
pub struct ForecastLookupQuery {
    /// Exact, case-sensitive location
    pub location: Option<String>,
}

/// List every stored forecast
#[utoipa::path(
    get,
    path = "/forecasts",
    tag = "forecasts",
    responses(
        (status = 200, description = "All stored forecasts", body = Vec<ForecastResponse>),
        (status = 500, description = "Store failure", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_forecasts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ForecastResponse>>, ApiError> {
    let records = state.forecast_service.list().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Look up the forecast for one date, optionally at one location
#[utoipa::path(
    get,
    path = "/forecasts/{date}",
    tag = "forecasts",
    params(
        ("date" = String, Path, description = "Date, e.g. 2024-01-01"),
        ForecastLookupQuery
    ),
    responses(
        (status = 200, description = "The forecast", body = ForecastResponse),
        (status = 400, description = "Unparseable date", body = crate::error::ErrorResponse),
        (status = 404, description = "No forecast for this key", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Query(query): Query<ForecastLookupQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let date = ForecastDate::parse(&date).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let record = state
        .forecast_service
        .get(date, query.location.as_deref())
        .await?;
    Ok(Json(record.into()))
}

/// Insert a forecast directly, without reconciling
#[utoipa::path(
    post,
    path = "/forecast",
    tag = "forecasts",
    request_body = CreateForecastRequest,
    responses(
        (status = 200, description = "The stored forecast", body = ForecastResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 500, description = "Store failure or duplicate key", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_forecast(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateForecastRequest>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let date =
        ForecastDate::parse(&request.date).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let record = state
        .forecast_service
        .create(NewForecast {
            date,
            temperature_c: request.temperature_c,
            summary: request.summary,
            location: request.location,
        })
        .await?;

    Ok(Json(record.into()))
}

/// Publish one random located observation onto the message channel
#[utoipa::path(
    post,
    path = "/forecast/publish-random",
    tag = "forecasts",
    responses(
        (status = 200, description = "Observation published", body = String, content_type = "text/plain"),
        (status = 500, description = "Channel failure", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn publish_random(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.publisher.publish_random().await?;
    Ok("Published")
}

/// Queue the aggregate processing job
#[utoipa::path(
    post,
    path = "/forecast/process",
    tag = "jobs",
    responses(
        (status = 200, description = "Job queued", body = String, content_type = "text/plain"),
        (status = 503, description = "Scheduler disabled", body = crate::error::ErrorResponse)
    )
)]
pub async fn process(State(state): State<AppState>) -> Result<String, ApiError> {
    enqueue(&state, ProcessingJob::All).await
}

/// Queue the per-location processing job
#[utoipa::path(
    post,
    path = "/forecast/process2",
    tag = "jobs",
    responses(
        (status = 200, description = "Job queued", body = String, content_type = "text/plain"),
        (status = 503, description = "Scheduler disabled", body = crate::error::ErrorResponse)
    )
)]
pub async fn process_by_location(State(state): State<AppState>) -> Result<String, ApiError> {
    enqueue(&state, ProcessingJob::ByLocation).await
}

async fn enqueue(state: &AppState, job: ProcessingJob) -> Result<String, ApiError> {
    info!(job = job.name(), "Processing");
    let job_id = state.processor.enqueue(job).await?;
    Ok(format!("Enqueued {job_id}"))
}
