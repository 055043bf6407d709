//! Structural paths: routes through the network topology, without clock times.

use chrono::Duration;

use super::{DomainError, LineId, StationId};

/// One ride between two adjacent stations on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralSegment {
    /// Display name of the boarding station
    pub from: String,
    /// Display name of the alighting station
    pub to: String,
    /// Boarding station record
    pub from_id: StationId,
    /// Alighting station record
    pub to_id: StationId,
    /// Line ridden
    pub line: LineId,
    /// Nominal travel time from the network graph
    pub travel_time: Duration,
}

/// A topology-only route: an ordered, chained sequence of segments.
///
/// # Invariants
///
/// - At least one segment
/// - `segments[i].to == segments[i + 1].from` (by station name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralPath {
    segments: Vec<StructuralSegment>,
}

impl StructuralPath {
    /// Construct a path from segments.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the list is empty or consecutive segments don't chain.
    pub fn new(segments: Vec<StructuralSegment>) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::Empty("structural path"));
        }

        for window in segments.windows(2) {
            if window[0].to != window[1].from {
                return Err(DomainError::NotChained {
                    previous_to: window[0].to.clone(),
                    next_from: window[1].from.clone(),
                });
            }
        }

        Ok(Self { segments })
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[StructuralSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: paths are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the origin station.
    pub fn origin(&self) -> &str {
        &self.segments[0].from
    }

    /// Name of the destination station.
    pub fn destination(&self) -> &str {
        &self.segments[self.segments.len() - 1].to
    }

    /// Number of times consecutive segments switch line.
    pub fn line_changes(&self) -> usize {
        self.segments
            .windows(2)
            .filter(|w| w[0].line != w[1].line)
            .count()
    }

    /// Sum of nominal travel times.
    pub fn nominal_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.travel_time).sum()
    }

    /// Nominal duration plus `change_penalty` for every line change.
    pub fn cost(&self, change_penalty: Duration) -> Duration {
        self.nominal_duration() + change_penalty * self.line_changes() as i32
    }

    /// Station names visited, origin first.
    pub fn station_names(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .map(|s| s.from.as_str())
            .chain(std::iter::once(self.destination()))
    }

    /// Deduplication key: the ordered (from, to, line) tuples.
    pub fn key(&self) -> Vec<(&str, &str, &LineId)> {
        self.segments
            .iter()
            .map(|s| (s.from.as_str(), s.to.as_str(), &s.line))
            .collect()
    }

    /// Returns true if the destination name appears before the final stop.
    ///
    /// Such paths are looping artifacts of the deviation search.
    pub fn revisits_destination(&self) -> bool {
        let destination = self.destination();
        self.segments.iter().any(|s| s.from == destination)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn segment(from: &str, to: &str, line: &str, secs: i64) -> StructuralSegment {
        StructuralSegment {
            from: from.to_string(),
            to: to.to_string(),
            from_id: StationId::parse(from).unwrap(),
            to_id: StationId::parse(to).unwrap(),
            line: LineId::parse(line).unwrap(),
            travel_time: Duration::seconds(secs),
        }
    }

    #[test]
    fn empty_path_rejected() {
        assert_eq!(
            StructuralPath::new(vec![]),
            Err(DomainError::Empty("structural path"))
        );
    }

    #[test]
    fn unchained_path_rejected() {
        let result = StructuralPath::new(vec![
            segment("A", "B", "1", 60),
            segment("C", "D", "1", 60),
        ]);
        assert!(matches!(result, Err(DomainError::NotChained { .. })));
    }

    #[test]
    fn cost_counts_line_changes() {
        let path = StructuralPath::new(vec![
            segment("A", "B", "1", 120),
            segment("B", "C", "1", 60),
            segment("C", "D", "2", 90),
        ])
        .unwrap();

        assert_eq!(path.line_changes(), 1);
        assert_eq!(path.nominal_duration(), Duration::seconds(270));
        assert_eq!(path.cost(Duration::seconds(600)), Duration::seconds(870));
        assert_eq!(path.origin(), "A");
        assert_eq!(path.destination(), "D");
        assert_eq!(
            path.station_names().collect::<Vec<_>>(),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn detects_destination_revisit() {
        let looping = StructuralPath::new(vec![
            segment("A", "D", "1", 60),
            segment("D", "E", "1", 60),
            segment("E", "D", "2", 60),
        ])
        .unwrap();
        assert!(looping.revisits_destination());

        let clean = StructuralPath::new(vec![
            segment("A", "B", "1", 60),
            segment("B", "D", "2", 60),
        ])
        .unwrap();
        assert!(!clean.revisits_destination());
    }
}
