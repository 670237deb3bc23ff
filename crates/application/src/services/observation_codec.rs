//! Wire format for observation messages
//!
//! Each message carries a routing type and a camelCase JSON body:
//!
//! ```json
//! {"date":"2024-01-01T09:30:00+01:00","temperatureC":5,"summary":"Cool","location":"Paris"}
//! ```
//!
//! `forecast.legacy` bodies have no `location`; `forecast.extended` bodies
//! require one. The date may be any timestamp; it is normalized to its
//! calendar day on decode.

use domain::{ForecastDate, ForecastObservation};
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Routing type for observations without a location
pub const LEGACY_MESSAGE_TYPE: &str = "forecast.legacy";

/// Routing type for observations with a location
pub const EXTENDED_MESSAGE_TYPE: &str = "forecast.extended";

/// JSON body of an observation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationMessage {
    pub date: String,
    pub temperature_c: i32,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ObservationMessage {
    /// Routing type matching this body's shape
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        if self.location.is_some() {
            EXTENDED_MESSAGE_TYPE
        } else {
            LEGACY_MESSAGE_TYPE
        }
    }

    /// Serialize the body
    pub fn to_json(&self) -> Result<String, ApplicationError> {
        serde_json::to_string(self)
            .map_err(|e| ApplicationError::Internal(format!("encode observation: {e}")))
    }
}

impl From<&ForecastObservation> for ObservationMessage {
    fn from(observation: &ForecastObservation) -> Self {
        Self {
            date: observation.date().start_of_day_utc().to_rfc3339(),
            temperature_c: observation.temperature_c(),
            summary: observation.summary().map(str::to_string),
            location: observation.location().map(str::to_string),
        }
    }
}

/// Decode a message into an observation
///
/// # Errors
///
/// Returns `ApplicationError::Validation` for an unknown type, a body that is
/// not valid JSON for its type, or an unparseable date.
pub fn decode_observation(
    message_type: &str,
    payload: &str,
) -> Result<ForecastObservation, ApplicationError> {
    let message: ObservationMessage = serde_json::from_str(payload)
        .map_err(|e| ApplicationError::Validation(format!("malformed {message_type}: {e}")))?;

    let date = ForecastDate::parse(&message.date)
        .map_err(|e| ApplicationError::Validation(e.to_string()))?;

    match message_type {
        LEGACY_MESSAGE_TYPE => Ok(ForecastObservation::legacy(
            date,
            message.temperature_c,
            message.summary,
        )),
        EXTENDED_MESSAGE_TYPE => {
            let location = message.location.ok_or_else(|| {
                ApplicationError::Validation(format!("{message_type} requires a location"))
            })?;
            ForecastObservation::extended(date, message.temperature_c, message.summary, location)
                .map_err(|e| ApplicationError::Validation(e.to_string()))
        },
        other => Err(ApplicationError::Validation(format!(
            "unknown message type: {other}"
        ))),
    }
}
