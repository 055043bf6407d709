//! Schedule data: the provider contract, an in-memory timetable source, and
//! the caching provider the engine runs against.

mod cache;
mod error;
mod provider;
mod source;
mod timetable;

pub use cache::{CachedSchedule, DEFAULT_TRANSFER_SECS, MIN_TRANSFER_SECS, ScheduleCacheConfig};
pub use error::ScheduleError;
pub use provider::ScheduleProvider;
pub use source::ScheduleSource;
pub use timetable::{StopCall, Timetable, TimetableBuilder, TransferRecord, Trip};
