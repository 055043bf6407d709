//! Schedule clock handling.
//!
//! Timetables express stop times as "HH:MM:SS" offsets from the start of a
//! service day. Trips running after midnight keep counting past 24:00
//! ("25:10:00"), so a stop time only becomes a wall-clock instant once it is
//! anchored to the service date it belongs to.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Error returned when parsing an invalid schedule time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schedule time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Latest hour accepted in a stop time. Service days never span more than
/// two calendar days.
const MAX_SERVICE_HOUR: u32 = 47;

/// A stop time relative to the start of its service day.
///
/// Values may exceed 24 hours for trips that run past midnight.
///
/// # Examples
///
/// ```
/// use metro_router::domain::ScheduleTime;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
/// let late = ScheduleTime::parse("25:10:00").unwrap();
/// let instant = late.on(date);
/// assert_eq!(instant.date(), NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
/// assert_eq!(late.to_string(), "25:10:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleTime(u32);

impl ScheduleTime {
    /// Create a stop time from seconds after the start of the service day.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Parse "HH:MM:SS" or "HH:MM".
    ///
    /// Hours may run up to 47 to describe trips past midnight.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let (h, m, sec) = match parts.as_slice() {
            [h, m] => (*h, *m, "00"),
            [h, m, sec] => (*h, *m, *sec),
            _ => return Err(TimeError::new("expected HH:MM:SS or HH:MM")),
        };

        let hour = parse_two_digits(h.as_bytes()).ok_or_else(|| TimeError::new("invalid hour"))?;
        if hour > MAX_SERVICE_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }
        let minute =
            parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        let second =
            parse_two_digits(sec.as_bytes()).ok_or_else(|| TimeError::new("invalid second"))?;
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Seconds after the start of the service day.
    pub fn secs(&self) -> u32 {
        self.0
    }

    /// Anchor this stop time to a service date.
    pub fn on(&self, service_date: NaiveDate) -> NaiveDateTime {
        service_date.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(self.0))
    }

    /// Signed duration from `earlier` to `self`.
    pub fn since(&self, earlier: ScheduleTime) -> Duration {
        Duration::seconds(i64::from(self.0) - i64::from(earlier.0))
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 % 3600) / 60,
            self.0 % 60
        )
    }
}

/// Parse a stop time and anchor it to a service date in one step.
pub fn parse_gtfs_time(s: &str, service_date: NaiveDate) -> Result<NaiveDateTime, TimeError> {
    ScheduleTime::parse(s).map(|t| t.on(service_date))
}

/// Parse a wall-clock "HH:MM" on a calendar date.
pub fn parse_hhmm(s: &str, date: NaiveDate) -> Result<NaiveDateTime, TimeError> {
    if s.len() != 5 {
        return Err(TimeError::new("expected HH:MM format"));
    }
    let time = ScheduleTime::parse(s)?;
    if time.secs() >= 24 * 3600 {
        return Err(TimeError::new("hour must be 0-23"));
    }
    Ok(time.on(date))
}

/// Format an instant as "HH:MM" for log lines and messages.
pub fn hhmm(instant: NaiveDateTime) -> String {
    format!("{:02}:{:02}", instant.hour(), instant.minute())
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
