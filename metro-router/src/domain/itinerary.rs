//! Scheduled departures and timed itineraries.
//!
//! A `TemporalItinerary` is a structural path bound to concrete scheduled
//! times. Its segments are validated at construction, so downstream code
//! (ranking, rendering) can rely on the chaining and timing invariants.

use chrono::{Duration, NaiveDateTime};

use super::{DomainError, LineId};

/// One scheduled call of a trip at a station, on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub trip_id: String,
    /// The trip ends here, so nobody can board it.
    pub terminates: bool,
}

/// A trip serving two stations of a line in order: when it leaves the first
/// and when it reaches the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRun {
    pub trip_id: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
}

impl TripRun {
    /// Scheduled time between the two stations.
    pub fn travel_time(&self) -> Duration {
        self.arrival.signed_duration_since(self.departure)
    }
}

/// One ride of an itinerary, placed on the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalSegment {
    from: String,
    to: String,
    line: LineId,
    trip_id: Option<String>,
    departure_time: NaiveDateTime,
    arrival_time: NaiveDateTime,
    wait_time: Duration,
    travel_time: Duration,
    transfer_time: Duration,
}

/// Parameters for a `TemporalSegment`, bundled for a readable constructor.
#[derive(Debug, Clone)]
pub struct SegmentTiming {
    pub departure_time: NaiveDateTime,
    pub travel_time: Duration,
    pub wait_time: Duration,
    pub transfer_time: Duration,
    pub trip_id: Option<String>,
}

impl TemporalSegment {
    /// Create a segment. Arrival is derived as departure plus travel time.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any of wait, travel or transfer time is negative.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        line: LineId,
        timing: SegmentTiming,
    ) -> Result<Self, DomainError> {
        if timing.wait_time < Duration::zero() {
            return Err(DomainError::NegativeDuration("wait time"));
        }
        if timing.travel_time < Duration::zero() {
            return Err(DomainError::NegativeDuration("travel time"));
        }
        if timing.transfer_time < Duration::zero() {
            return Err(DomainError::NegativeDuration("transfer time"));
        }

        Ok(Self {
            from: from.into(),
            to: to.into(),
            line,
            trip_id: timing.trip_id,
            departure_time: timing.departure_time,
            arrival_time: timing.departure_time + timing.travel_time,
            wait_time: timing.wait_time,
            travel_time: timing.travel_time,
            transfer_time: timing.transfer_time,
        })
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn line(&self) -> &LineId {
        &self.line
    }

    /// Trip boarded, when the schedule identified one.
    pub fn trip_id(&self) -> Option<&str> {
        self.trip_id.as_deref()
    }

    pub fn departure_time(&self) -> NaiveDateTime {
        self.departure_time
    }

    pub fn arrival_time(&self) -> NaiveDateTime {
        self.arrival_time
    }

    /// Time spent waiting on the platform before departure.
    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    pub fn travel_time(&self) -> Duration {
        self.travel_time
    }

    /// Time spent walking between platforms before boarding.
    pub fn transfer_time(&self) -> Duration {
        self.transfer_time
    }

    /// Earliest instant this segment can be boarded after `previous`.
    fn ready_after(&self, previous: &TemporalSegment) -> NaiveDateTime {
        previous.arrival_time + self.transfer_time
    }
}

/// A complete timed itinerary from origin to destination.
///
/// # Invariants
///
/// - At least one segment
/// - Consecutive segments chain: `segments[i].to == segments[i + 1].from`
/// - `segments[i + 1].departure >= segments[i].arrival + segments[i + 1].transfer`
/// - `departure_time <= segments[0].departure`
///
/// `departure_time` is when the traveller is at the origin: the requested
/// time in depart-at mode, the first boarding in arrive-by mode. Total
/// duration is always measured from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalItinerary {
    segments: Vec<TemporalSegment>,
    departure_time: NaiveDateTime,
}

impl TemporalItinerary {
    /// Construct an itinerary that starts when the traveller is ready at the
    /// origin (`departure_time`).
    ///
    /// # Errors
    ///
    /// Returns `Err` if segments are empty, don't chain, or overlap in time.
    pub fn new(
        segments: Vec<TemporalSegment>,
        departure_time: NaiveDateTime,
    ) -> Result<Self, DomainError> {
        let first = segments
            .first()
            .ok_or(DomainError::Empty("temporal itinerary"))?;

        if first.departure_time < departure_time {
            return Err(DomainError::DepartsTooEarly {
                station: first.from.clone(),
                departure: first.departure_time,
                ready: departure_time,
            });
        }

        for window in segments.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            if prev.to != next.from {
                return Err(DomainError::NotChained {
                    previous_to: prev.to.clone(),
                    next_from: next.from.clone(),
                });
            }
            let ready = next.ready_after(prev);
            if next.departure_time < ready {
                return Err(DomainError::DepartsTooEarly {
                    station: next.from.clone(),
                    departure: next.departure_time,
                    ready,
                });
            }
        }

        Ok(Self {
            segments,
            departure_time,
        })
    }

    /// Construct an itinerary that starts at its first boarding.
    pub fn from_segments(segments: Vec<TemporalSegment>) -> Result<Self, DomainError> {
        let departure_time = segments
            .first()
            .map(|s| s.departure_time)
            .ok_or(DomainError::Empty("temporal itinerary"))?;
        Self::new(segments, departure_time)
    }

    /// Re-anchor the itinerary to an earlier requested departure.
    ///
    /// Used when the planner evaluated from a suggested service time but the
    /// caller asked for an earlier one.
    pub fn with_requested_departure(self, requested: NaiveDateTime) -> Result<Self, DomainError> {
        Self::new(self.segments, requested.min(self.departure_time))
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[TemporalSegment] {
        &self.segments
    }

    /// Origin station name.
    pub fn origin(&self) -> &str {
        // Safe: validated non-empty at construction
        &self.segments[0].from
    }

    /// Destination station name.
    pub fn destination(&self) -> &str {
        &self.segments[self.segments.len() - 1].to
    }

    pub fn departure_time(&self) -> NaiveDateTime {
        self.departure_time
    }

    /// First scheduled boarding.
    pub fn first_boarding(&self) -> NaiveDateTime {
        self.segments[0].departure_time
    }

    pub fn arrival_time(&self) -> NaiveDateTime {
        self.segments[self.segments.len() - 1].arrival_time
    }

    /// `arrival_time - departure_time`.
    pub fn total_duration(&self) -> Duration {
        self.arrival_time()
            .signed_duration_since(self.departure_time)
    }

    /// Sum of segment wait times.
    pub fn total_wait_time(&self) -> Duration {
        self.segments.iter().map(|s| s.wait_time).sum()
    }

    /// Sum of platform transfer times.
    pub fn total_transfer_time(&self) -> Duration {
        self.segments.iter().map(|s| s.transfer_time).sum()
    }

    /// Number of line changes.
    pub fn line_changes(&self) -> usize {
        self.segments
            .windows(2)
            .filter(|w| w[0].line != w[1].line)
            .count()
    }
}
