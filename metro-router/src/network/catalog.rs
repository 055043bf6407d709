//! The station catalog: station records, their edges, and name lookup.
//!
//! The catalog is built once at startup and never mutated afterwards, so it
//! can be shared across concurrent requests behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::{Edge, LineId, Station, StationId};

use super::NetworkError;

/// An edge with its endpoints and line resolved to dense indices.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link {
    pub from: usize,
    pub to: usize,
    pub secs: i64,
    pub line: usize,
}

/// Immutable station graph.
#[derive(Debug, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
    by_id: HashMap<StationId, usize>,
    by_name: BTreeMap<String, Vec<usize>>,
    edges: Vec<Edge>,
    links: Vec<Link>,
    lines: Vec<LineId>,
    /// Outgoing link indices per station index
    outgoing: Vec<Vec<usize>>,
}

impl StationCatalog {
    /// Start building a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Number of station records.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Returns true if the catalog holds no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All directed edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Look up a station record by identifier.
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.by_id.get(id).map(|&idx| &self.stations[idx])
    }

    /// Returns true if some station record carries this display name.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Distinct display names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// All station records sharing a display name.
    pub fn records(&self, name: &str) -> Result<Vec<&Station>, NetworkError> {
        self.resolve(name)
            .map(|indices| indices.iter().map(|&idx| &self.stations[idx]).collect())
    }

    /// Lines serving any record with this display name.
    pub fn lines_at(&self, name: &str) -> Result<BTreeSet<LineId>, NetworkError> {
        Ok(self
            .records(name)?
            .into_iter()
            .flat_map(|s| s.lines.iter().cloned())
            .collect())
    }

    /// Dense indices of the records with this display name.
    pub(crate) fn resolve(&self, name: &str) -> Result<&[usize], NetworkError> {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| NetworkError::UnknownStation(name.to_string()))
    }

    pub(crate) fn station_at(&self, idx: usize) -> &Station {
        &self.stations[idx]
    }

    /// Other records sharing a name with the record at `idx`.
    pub(crate) fn platforms(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.by_name
            .get(&self.stations[idx].name)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&other| other != idx)
    }

    pub(crate) fn outgoing(&self, idx: usize) -> &[usize] {
        &self.outgoing[idx]
    }

    pub(crate) fn link(&self, link: usize) -> Link {
        self.links[link]
    }

    pub(crate) fn edge(&self, link: usize) -> &Edge {
        &self.edges[link]
    }

    pub(crate) fn line(&self, line: usize) -> &LineId {
        &self.lines[line]
    }
}

/// Accumulates stations and edges, then freezes them into a `StationCatalog`.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: StationCatalog,
    line_index: HashMap<LineId, usize>,
}

impl CatalogBuilder {
    /// Add a station record.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a record with the same identifier already exists.
    pub fn add_station(&mut self, station: Station) -> Result<&mut Self, NetworkError> {
        if self.catalog.by_id.contains_key(&station.id) {
            return Err(NetworkError::DuplicateStation(station.id));
        }

        let idx = self.catalog.stations.len();
        self.catalog.by_id.insert(station.id.clone(), idx);
        self.catalog
            .by_name
            .entry(station.name.clone())
            .or_default()
            .push(idx);
        self.catalog.stations.push(station);
        self.catalog.outgoing.push(Vec::new());
        Ok(self)
    }

    /// Add a directed edge.
    ///
    /// When `line` is `None` the edge is tagged with the first line both
    /// stations serve; if they share none the edge is skipped with a warning.
    /// Edges between records of the same display name are dropped, since
    /// moving between platforms of one stop is implicit.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either identifier is unknown.
    pub fn connect(
        &mut self,
        from: &StationId,
        to: &StationId,
        travel_time: Duration,
        line: Option<LineId>,
    ) -> Result<&mut Self, NetworkError> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;
        let (from_station, to_station) = (
            &self.catalog.stations[from_idx],
            &self.catalog.stations[to_idx],
        );

        if from_station.name == to_station.name {
            debug!(station = %from_station.name, "dropping edge between platforms of one stop");
            return Ok(self);
        }

        let line = match line.or_else(|| from_station.common_line(to_station).cloned()) {
            Some(line) => line,
            None => {
                warn!(
                    from = %from_station.name,
                    to = %to_station.name,
                    "skipping edge: no common serving line"
                );
                return Ok(self);
            }
        };

        let line_idx = self.intern(&line);
        let link_idx = self.catalog.links.len();
        self.catalog.links.push(Link {
            from: from_idx,
            to: to_idx,
            secs: travel_time.num_seconds().max(0),
            line: line_idx,
        });
        self.catalog.edges.push(Edge {
            from: from.clone(),
            to: to.clone(),
            travel_time,
            line,
        });
        self.catalog.outgoing[from_idx].push(link_idx);
        Ok(self)
    }

    /// Add edges in both directions with the same travel time.
    pub fn connect_both(
        &mut self,
        a: &StationId,
        b: &StationId,
        travel_time: Duration,
        line: Option<LineId>,
    ) -> Result<&mut Self, NetworkError> {
        self.connect(a, b, travel_time, line.clone())?;
        self.connect(b, a, travel_time, line)
    }

    /// Freeze the catalog.
    pub fn build(self) -> StationCatalog {
        debug!(
            stations = self.catalog.stations.len(),
            edges = self.catalog.edges.len(),
            lines = self.catalog.lines.len(),
            "built station catalog"
        );
        self.catalog
    }

    fn index_of(&self, id: &StationId) -> Result<usize, NetworkError> {
        self.catalog
            .by_id
            .get(id)
            .copied()
            .ok_or_else(|| NetworkError::UnknownStationId(id.clone()))
    }

    fn intern(&mut self, line: &LineId) -> usize {
        if let Some(&idx) = self.line_index.get(line) {
            return idx;
        }
        let idx = self.catalog.lines.len();
        self.catalog.lines.push(line.clone());
        self.line_index.insert(line.clone(), idx);
        idx
    }
}
