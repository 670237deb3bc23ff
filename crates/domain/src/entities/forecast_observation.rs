//! Forecast observations - Readings delivered by the message channel
//!
//! Two shapes exist on the wire. The legacy shape has no location and is
//! matched against stored records by date alone; the extended shape carries a
//! location and is matched by date and exact location.

use std::fmt;

use crate::errors::DomainError;
use crate::value_objects::ForecastDate;

/// Which observation shape was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationVariant {
    /// Date, temperature and summary
    Legacy,
    /// Date, temperature, summary and location
    Extended,
}

impl ObservationVariant {
    /// Stable label used for logs and metric labels
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for ObservationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lookup key that decides update-vs-insert
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ForecastKey {
    /// Match on date only
    Date(ForecastDate),
    /// Match on date and exact, case-sensitive location
    DateAndLocation(ForecastDate, String),
}

impl ForecastKey {
    /// Date component of the key
    #[must_use]
    pub const fn date(&self) -> ForecastDate {
        match self {
            Self::Date(date) | Self::DateAndLocation(date, _) => *date,
        }
    }

    /// Location component, if the key has one
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateAndLocation(_, location) => Some(location),
        }
    }
}

impl fmt::Display for ForecastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::DateAndLocation(date, location) => write!(f, "{date}@{location}"),
        }
    }
}

/// A single forecast reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastObservation {
    /// Reading without a location
    Legacy {
        date: ForecastDate,
        temperature_c: i32,
        summary: Option<String>,
    },
    /// Reading for a named location
    Extended {
        date: ForecastDate,
        temperature_c: i32,
        summary: Option<String>,
        location: String,
    },
}

impl ForecastObservation {
    /// Create a legacy observation
    #[must_use]
    pub const fn legacy(date: ForecastDate, temperature_c: i32, summary: Option<String>) -> Self {
        Self::Legacy {
            date,
            temperature_c,
            summary,
        }
    }

    /// Create an extended observation
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the location is blank.
    pub fn extended(
        date: ForecastDate,
        temperature_c: i32,
        summary: Option<String>,
        location: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "location must not be empty".to_string(),
            ));
        }
        Ok(Self::Extended {
            date,
            temperature_c,
            summary,
            location,
        })
    }

    /// Which shape this observation has
    #[must_use]
    pub const fn variant(&self) -> ObservationVariant {
        match self {
            Self::Legacy { .. } => ObservationVariant::Legacy,
            Self::Extended { .. } => ObservationVariant::Extended,
        }
    }

    #[must_use]
    pub const fn date(&self) -> ForecastDate {
        match self {
            Self::Legacy { date, .. } | Self::Extended { date, .. } => *date,
        }
    }

    #[must_use]
    pub const fn temperature_c(&self) -> i32 {
        match self {
            Self::Legacy { temperature_c, .. } | Self::Extended { temperature_c, .. } => {
                *temperature_c
            },
        }
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Legacy { summary, .. } | Self::Extended { summary, .. } => summary.as_deref(),
        }
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Legacy { .. } => None,
            Self::Extended { location, .. } => Some(location),
        }
    }

    /// The key used to look up an existing record
    #[must_use]
    pub fn key(&self) -> ForecastKey {
        match self {
            Self::Legacy { date, .. } => ForecastKey::Date(*date),
            Self::Extended { date, location, .. } => {
                ForecastKey::DateAndLocation(*date, location.clone())
            },
        }
    }
}
