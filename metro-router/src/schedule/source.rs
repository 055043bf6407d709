//! Raw schedule sources behind the cache.

use chrono::{Duration, NaiveDate};

use crate::domain::{Departure, LineId, TripRun};

use super::ScheduleError;

/// A backing store of timetable data.
///
/// Lookups may be expensive scans; `CachedSchedule` calls each one at most
/// once per key and source generation.
pub trait ScheduleSource: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Every call of `line` at `station` on `date`, sorted by departure.
    fn departures(
        &self,
        station: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, ScheduleError>;

    /// Trips of `line` calling at `from` then `to` on service date `date`.
    fn trip_runs(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> Result<Vec<TripRun>, ScheduleError>;

    /// Largest recorded transfer between a platform of `station` served by
    /// `from_line` and one served by `to_line`.
    fn transfer_record(
        &self,
        station: &str,
        from_line: &LineId,
        to_line: &LineId,
    ) -> Result<Option<Duration>, ScheduleError>;

    /// Scheduled `from` to `to` times of every trip of `line` serving both.
    fn travel_samples(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
    ) -> Result<Vec<Duration>, ScheduleError>;

    /// Lines with calls at `station`, sorted and deduplicated.
    fn lines(&self, station: &str) -> Result<Vec<LineId>, ScheduleError>;
}
