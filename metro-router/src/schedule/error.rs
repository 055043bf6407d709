//! Schedule error types.

/// Errors from a schedule source or the provider wrapping it.
///
/// `Clone` so a single failed load can be handed to every caller waiting on
/// the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The underlying data source failed
    #[error("schedule source {source_name} unavailable: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },

    /// Timetable data was rejected while building a source
    #[error("invalid schedule data: {0}")]
    InvalidData(String),
}

impl ScheduleError {
    pub fn unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
