//! Routing error types.
//!
//! "No route" is not an error: the engine returns `None` or an empty list.
//! These are the outcomes the caller can't recover from by picking another
//! time.

use crate::network::NetworkError;
use crate::schedule::ScheduleError;

/// Errors surfaced by the routing engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// Station name not in the catalog
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// Request parameters are malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The schedule source failed
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl From<NetworkError> for RoutingError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::UnknownStation(name) => Self::UnknownStation(name),
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}
