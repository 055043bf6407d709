//! Binding structural paths to the timetable.
//!
//! The evaluator turns one `StructuralPath` into a `TemporalItinerary`,
//! either forward from a departure time (`forward.rs`) or backward from an
//! arrival deadline (`backward.rs`). A candidate that can't be placed on the
//! clock is rejected, not an error: only schedule source failures propagate.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{
    DomainError, LineId, SegmentTiming, StructuralPath, StructuralSegment, TemporalItinerary,
    TemporalSegment, TripRun,
};
use crate::schedule::{ScheduleError, ScheduleProvider};

/// Why a candidate path produced no itinerary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// No scheduled departure fits
    #[error("no feasible departure on line {line} from {station}")]
    NoDeparture { station: String, line: LineId },

    /// A segment's wait exceeds the tolerance
    #[error("wait of {wait_secs}s at {station} exceeds the limit")]
    WaitTooLong { station: String, wait_secs: i64 },

    /// The path passes through its destination before the end
    #[error("path revisits its destination")]
    RevisitsDestination,

    /// The placed segments violate an itinerary invariant
    #[error("inconsistent itinerary: {0}")]
    Invalid(#[from] DomainError),
}

/// Internal failure of one evaluation.
pub(super) enum Failure {
    Rejected(Rejection),
    Schedule(ScheduleError),
}

impl From<Rejection> for Failure {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}

impl From<ScheduleError> for Failure {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

impl From<DomainError> for Failure {
    fn from(e: DomainError) -> Self {
        Self::Rejected(Rejection::Invalid(e))
    }
}

/// A chosen trip for one segment.
#[derive(Debug, Clone)]
pub(super) struct Boarding {
    pub departure: NaiveDateTime,
    pub travel: Duration,
    pub trip_id: Option<String>,
}

impl Boarding {
    pub fn arrival(&self) -> NaiveDateTime {
        self.departure + self.travel
    }

    /// Boarding `run`, timed with `representative` when the schedule has
    /// one for the pair.
    pub fn from_run(run: &TripRun, representative: Option<Duration>) -> Self {
        Self {
            departure: run.departure,
            travel: representative.unwrap_or_else(|| run.travel_time()),
            trip_id: Some(run.trip_id.clone()),
        }
    }

    /// Boarding `run` at exactly its scheduled times.
    pub fn scheduled(run: &TripRun) -> Self {
        Self::from_run(run, None)
    }
}

/// Places structural paths on the clock using a schedule provider.
pub struct Evaluator<'a, P> {
    pub(super) provider: &'a P,
    pub(super) continuation_tolerance: Duration,
}

impl<'a, P: ScheduleProvider> Evaluator<'a, P> {
    pub fn new(provider: &'a P, continuation_tolerance: Duration) -> Self {
        Self {
            provider,
            continuation_tolerance,
        }
    }

    /// Log a rejection and turn the outcome into the public shape.
    pub(super) fn settle(
        path: &StructuralPath,
        outcome: Result<TemporalItinerary, Failure>,
    ) -> Result<Option<TemporalItinerary>, ScheduleError> {
        match outcome {
            Ok(itinerary) => Ok(Some(itinerary)),
            Err(Failure::Rejected(reason)) => {
                debug!(
                    path = %path.station_names().collect::<Vec<_>>().join(" > "),
                    %reason,
                    "candidate rejected"
                );
                Ok(None)
            }
            Err(Failure::Schedule(e)) => Err(e),
        }
    }

    /// Runs of the segment's line between its stations, for every service
    /// date in `dates`, merged and sorted by departure.
    pub(super) async fn runs_on(
        &self,
        seg: &StructuralSegment,
        dates: &[NaiveDate],
    ) -> Result<Vec<TripRun>, ScheduleError> {
        let mut runs = Vec::new();
        for &date in dates {
            let loaded = self
                .provider
                .trip_runs(&seg.from, &seg.to, &seg.line, date)
                .await?;
            runs.extend(loaded.iter().cloned());
        }
        runs.sort_by(|a, b| {
            a.departure
                .cmp(&b.departure)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
        });
        Ok(runs)
    }

    /// Every boarding option for a segment on `dates`. Only trips that call
    /// at `seg.from` and later at `seg.to` are offered: a line that merely
    /// stops at `seg.from` does not make the ride exist.
    pub(super) async fn boardings_on(
        &self,
        seg: &StructuralSegment,
        dates: &[NaiveDate],
        representative: Option<Duration>,
    ) -> Result<Vec<Boarding>, ScheduleError> {
        Ok(self
            .runs_on(seg, dates)
            .await?
            .iter()
            .map(|run| Boarding::from_run(run, representative))
            .collect())
    }
}

/// Build a validated segment.
pub(super) fn place(
    seg: &StructuralSegment,
    boarding: &Boarding,
    wait: Duration,
    transfer: Duration,
) -> Result<TemporalSegment, DomainError> {
    TemporalSegment::new(
        seg.from.clone(),
        seg.to.clone(),
        seg.line.clone(),
        SegmentTiming {
            departure_time: boarding.departure,
            travel_time: boarding.travel,
            wait_time: wait,
            transfer_time: transfer,
            trip_id: boarding.trip_id.clone(),
        },
    )
}

/// `date` and its neighbours, clamped to the representable calendar.
pub(super) fn around(date: NaiveDate, before: bool, after: bool) -> Vec<NaiveDate> {
    let prev = date.checked_sub_days(Days::new(1)).filter(|_| before);
    let next = date.checked_add_days(Days::new(1)).filter(|_| after);
    prev.into_iter()
        .chain(std::iter::once(date))
        .chain(next)
        .collect()
}
