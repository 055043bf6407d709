//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from schedule source failures and routing outcomes.

use chrono::NaiveDateTime;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Identifier was empty or contained only whitespace
    #[error("invalid {kind} identifier: must not be blank")]
    BlankIdentifier { kind: &'static str },

    /// A path or itinerary needs at least one segment
    #[error("{0} must have at least one segment")]
    Empty(&'static str),

    /// Consecutive segments don't share a station
    #[error("segments are not chained: {previous_to} does not lead to {next_from}")]
    NotChained {
        previous_to: String,
        next_from: String,
    },

    /// A duration that must be non-negative was negative
    #[error("negative {0}")]
    NegativeDuration(&'static str),

    /// A segment departs before the previous one arrives (plus transfer)
    #[error("segment from {station} departs at {departure} before it can be boarded at {ready}")]
    DepartsTooEarly {
        station: String,
        departure: NaiveDateTime,
        ready: NaiveDateTime,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::BlankIdentifier { kind: "station" };
        assert_eq!(
            err.to_string(),
            "invalid station identifier: must not be blank"
        );

        let err = DomainError::Empty("structural path");
        assert_eq!(
            err.to_string(),
            "structural path must have at least one segment"
        );

        let err = DomainError::NotChained {
            previous_to: "Bastille".into(),
            next_from: "Nation".into(),
        };
        assert_eq!(
            err.to_string(),
            "segments are not chained: Bastille does not lead to Nation"
        );

        let err = DomainError::NegativeDuration("wait time");
        assert_eq!(err.to_string(), "negative wait time");
    }
}
