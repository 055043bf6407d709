//! Domain types for the metro router.
//!
//! This module contains the core domain model types that represent
//! validated network and schedule data. All types enforce their invariants
//! at construction time, so code that receives these types can trust their
//! validity.

mod availability;
mod error;
mod itinerary;
mod path;
mod station;
mod time;

pub use availability::ServiceAvailability;
pub use error::DomainError;
pub use itinerary::{Departure, SegmentTiming, TemporalItinerary, TemporalSegment, TripRun};
pub use path::{StructuralPath, StructuralSegment};
pub use station::{Edge, LineId, Station, StationId};
pub use time::{ScheduleTime, TimeError, hhmm, parse_gtfs_time, parse_hhmm};

#[cfg(test)]
pub(crate) use itinerary::tests::{at, ride};
#[cfg(test)]
pub(crate) use path::tests::segment;
