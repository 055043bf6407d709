//! Station and line identifiers, stations and edges.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Duration;

use super::DomainError;

/// Internal identifier of one physical station record (a platform).
///
/// Several records may share a display name. Identity is by identifier;
/// "same place" is decided by name.
///
/// # Examples
///
/// ```
/// use metro_router::domain::StationId;
///
/// let id = StationId::parse("0016").unwrap();
/// assert_eq!(id.as_str(), "0016");
///
/// // Blank identifiers are rejected
/// assert!(StationId::parse("  ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(String);

impl StationId {
    /// Parse a station identifier. Surrounding whitespace is trimmed.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BlankIdentifier { kind: "station" });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a metro or RER line ("1", "7B", "A").
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(String);

impl LineId {
    /// Parse a line identifier. Surrounding whitespace is trimmed.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BlankIdentifier { kind: "line" });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A station record as loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Unique identifier of this record
    pub id: StationId,
    /// Display name, shared by all platforms of the same stop
    pub name: String,
    /// Lines serving this record
    pub lines: BTreeSet<LineId>,
    /// Whether a line terminates here
    pub terminus: bool,
}

impl Station {
    /// Create a non-terminus station serving the given lines.
    pub fn new(id: StationId, name: impl Into<String>, lines: impl IntoIterator<Item = LineId>) -> Self {
        Self {
            id,
            name: name.into(),
            lines: lines.into_iter().collect(),
            terminus: false,
        }
    }

    /// Mark this station as a terminus.
    pub fn with_terminus(mut self, terminus: bool) -> Self {
        self.terminus = terminus;
        self
    }

    /// Returns true if `line` serves this station.
    pub fn serves(&self, line: &LineId) -> bool {
        self.lines.contains(line)
    }

    /// The first line (in identifier order) serving both stations.
    pub fn common_line<'a>(&'a self, other: &'a Station) -> Option<&'a LineId> {
        self.lines.intersection(&other.lines).next()
    }
}

/// A directed connection between two station records on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: StationId,
    pub to: StationId,
    pub travel_time: Duration,
    pub line: LineId,
}
