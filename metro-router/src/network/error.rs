//! Network error types.

use crate::domain::StationId;

/// Errors from building or querying the station network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// No station record carries this display name
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// An edge referenced a station identifier that was never added
    #[error("unknown station identifier: {0}")]
    UnknownStationId(StationId),

    /// The same station identifier was added twice
    #[error("duplicate station identifier: {0}")]
    DuplicateStation(StationId),
}
