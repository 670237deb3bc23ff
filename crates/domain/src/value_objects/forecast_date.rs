//! Forecast date value object
//!
//! A forecast is keyed by calendar day. Incoming timestamps are truncated to
//! the calendar day they name (in their own offset) and that day is then
//! expressed in UTC, so `2024-01-01T23:30:00+02:00` and `2024-01-01T08:00:00Z`
//! both map to the same key.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::ForecastDate;
//!
//! let date = ForecastDate::parse("2024-01-01T17:45:00+01:00").unwrap();
//! assert_eq!(date.to_string(), "2024-01-01");
//! assert_eq!(date.start_of_day_utc().to_rfc3339(), "2024-01-01T00:00:00+00:00");
//! ```

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DomainError;

/// Storage and display format for a forecast date
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar day of a forecast, normalized to UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastDate(NaiveDate);

impl ForecastDate {
    /// Wrap an already-normalized calendar day
    #[must_use]
    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Truncate a timestamp to the calendar day it names in its own offset
    #[must_use]
    pub fn from_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self(timestamp.date_naive())
    }

    /// Build a date from year, month and day
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDateTime` if the components do not form a
    /// valid calendar day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DomainError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidDateTime(format!("{year}-{month}-{day}")))
    }

    /// Today's date in UTC
    #[must_use]
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Parse a date from an RFC 3339 timestamp, a naive ISO 8601 timestamp
    /// (taken as UTC) or a plain `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDateTime` if the input matches none of
    /// the accepted formats.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidDateTime("empty date".to_string()));
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::from_timestamp(&timestamp));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(naive.date()));
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(Self)
            .map_err(|_| DomainError::InvalidDateTime(trimmed.to_string()))
    }

    /// The underlying calendar day
    #[must_use]
    pub const fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    /// Midnight UTC at the start of this day
    #[must_use]
    pub fn start_of_day_utc(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    /// This date shifted forward by `days`, or `None` on overflow
    #[must_use]
    pub fn checked_add_days(self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(Self)
    }
}

impl fmt::Display for ForecastDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl std::str::FromStr for ForecastDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for ForecastDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for ForecastDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.start_of_day_utc().to_rfc3339_opts(
            chrono::SecondsFormat::Secs,
            true,
        ))
    }
}

impl<'de> Deserialize<'de> for ForecastDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
