//! Service availability at a station.

use chrono::NaiveDateTime;

/// Whether a station has scheduled service at a requested time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAvailability {
    /// Earliest departure across all lines on the requested date
    pub first_departure: Option<NaiveDateTime>,
    /// Latest departure across all lines on the requested date
    pub last_departure: Option<NaiveDateTime>,
    /// True if the requested time falls within `[first, last]`
    pub is_available: bool,
    /// A time the caller may retry with, when not available
    pub suggested_alternative: Option<NaiveDateTime>,
    /// Human-readable explanation
    pub message: String,
}

impl ServiceAvailability {
    /// No schedule data at all for the station.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            first_departure: None,
            last_departure: None,
            is_available: false,
            suggested_alternative: None,
            message: message.into(),
        }
    }
}
