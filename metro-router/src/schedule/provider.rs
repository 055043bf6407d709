//! What the routing engine needs from schedule data.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::domain::{Departure, LineId, TripRun};

use super::ScheduleError;

/// Schedule queries consumed by the planner.
///
/// Stations are addressed by display name. All methods may be called
/// concurrently from many requests. Errors mean the data source itself
/// failed; "no service" is an empty result, never an error.
pub trait ScheduleProvider: Send + Sync {
    /// Every scheduled call of `line` at `station` on `date`, sorted by
    /// departure.
    fn station_schedules(
        &self,
        station: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Arc<Vec<Departure>>, ScheduleError>> + Send;

    /// Trips of `line` calling at `from` and later at `to`, running on
    /// service date `date`, sorted by departure from `from`.
    fn trip_runs(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Arc<Vec<TripRun>>, ScheduleError>> + Send;

    /// Minimum time to change from `from_line` to `to_line` at `station`.
    /// Zero when the lines are the same.
    fn transfer_time(
        &self,
        station: &str,
        from_line: &LineId,
        to_line: &LineId,
    ) -> impl Future<Output = Result<Duration, ScheduleError>> + Send;

    /// Typical scheduled time from `from` to `to` on `line`, if any trip
    /// serves the pair.
    fn representative_travel_time(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
    ) -> impl Future<Output = Result<Option<Duration>, ScheduleError>> + Send;

    /// Lines with scheduled calls at `station`, sorted.
    fn lines(
        &self,
        station: &str,
    ) -> impl Future<Output = Result<Arc<Vec<LineId>>, ScheduleError>> + Send;
}
