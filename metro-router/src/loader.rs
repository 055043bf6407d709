//! Loading a network bundle from disk.
//!
//! A bundle is one JSON document holding the station records, the edges
//! between them, the trips of every line and the transfer records. Records
//! are deserialized into loose DTOs first, then validated into the domain
//! types: a station's `line` may be a single string or a list, and is always
//! normalised to a set of `LineId`s here.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use tracing::info;

use crate::domain::{DomainError, LineId, ScheduleTime, Station, StationId, TimeError};
use crate::network::{NetworkError, StationCatalog};
use crate::schedule::{ScheduleError, StopCall, Timetable};

/// Errors loading a bundle.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file couldn't be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document isn't a valid bundle
    #[error("malformed bundle: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Time(#[from] TimeError),
}

/// A station's `line` field as found in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LineField {
    One(String),
    Many(Vec<String>),
}

impl LineField {
    fn names(&self) -> Vec<&str> {
        match self {
            Self::One(line) => vec![line.as_str()],
            Self::Many(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StationRecord {
    id: String,
    name: String,
    /// Lines serving the record. Lines of trips calling here are added.
    #[serde(default)]
    line: Option<LineField>,
    #[serde(default)]
    terminus: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeRecord {
    from: String,
    to: String,
    /// Travel time in seconds.
    time: i64,
    #[serde(default)]
    line: Option<String>,
    #[serde(default = "both_ways")]
    bidirectional: bool,
}

fn both_ways() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct StopTimeRecord {
    stop_id: String,
    arrival: String,
    /// Defaults to the arrival time.
    #[serde(default)]
    departure: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TripRecord {
    trip_id: String,
    line: String,
    stop_times: Vec<StopTimeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct TransferRow {
    from_stop_id: String,
    to_stop_id: String,
    /// Seconds.
    min_transfer_time: i64,
}

/// The raw bundle document.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkBundle {
    #[serde(default)]
    name: Option<String>,
    stations: Vec<StationRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
    #[serde(default)]
    trips: Vec<TripRecord>,
    #[serde(default)]
    transfers: Vec<TransferRow>,
}

/// A validated network ready to route on.
#[derive(Debug)]
pub struct LoadedNetwork {
    pub catalog: StationCatalog,
    pub timetable: Timetable,
}

impl NetworkBundle {
    /// Read and parse a bundle file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the records into a catalog and a timetable.
    pub fn into_network(self) -> Result<LoadedNetwork, LoadError> {
        let trip_lines = self.lines_by_stop();

        let mut catalog = StationCatalog::builder();
        let mut timetable = Timetable::builder(self.name.as_deref().unwrap_or("bundle"));

        for record in &self.stations {
            let id = StationId::parse(&record.id)?;
            let mut lines = record
                .line
                .as_ref()
                .map(LineField::names)
                .unwrap_or_default()
                .into_iter()
                .map(LineId::parse)
                .collect::<Result<BTreeSet<_>, _>>()?;
            if let Some(extra) = trip_lines.get(record.id.as_str()) {
                lines.extend(extra.iter().cloned());
            }

            timetable.stop(id.clone(), record.name.clone());
            catalog.add_station(
                Station::new(id, record.name.clone(), lines).with_terminus(record.terminus),
            )?;
        }

        for edge in &self.edges {
            if edge.time < 0 {
                return Err(DomainError::NegativeDuration("edge travel time").into());
            }
            let from = StationId::parse(&edge.from)?;
            let to = StationId::parse(&edge.to)?;
            let line = edge.line.as_deref().map(LineId::parse).transpose()?;
            let travel = Duration::seconds(edge.time);
            if edge.bidirectional {
                catalog.connect_both(&from, &to, travel, line)?;
            } else {
                catalog.connect(&from, &to, travel, line)?;
            }
        }

        for trip in &self.trips {
            let calls = trip
                .stop_times
                .iter()
                .map(|st| -> Result<StopCall, LoadError> {
                    let arrival = ScheduleTime::parse(&st.arrival)?;
                    let departure = match &st.departure {
                        Some(d) => ScheduleTime::parse(d)?,
                        None => arrival,
                    };
                    Ok(StopCall::new(StationId::parse(&st.stop_id)?, arrival, departure))
                })
                .collect::<Result<Vec<_>, _>>()?;
            timetable.trip(trip.trip_id.clone(), LineId::parse(&trip.line)?, calls)?;
        }

        for transfer in &self.transfers {
            if transfer.min_transfer_time < 0 {
                return Err(DomainError::NegativeDuration("transfer time").into());
            }
            timetable.transfer(
                StationId::parse(&transfer.from_stop_id)?,
                StationId::parse(&transfer.to_stop_id)?,
                Duration::seconds(transfer.min_transfer_time),
            );
        }

        let catalog = catalog.build();
        let timetable = timetable.build();
        info!(
            stations = catalog.len(),
            edges = catalog.edge_count(),
            trips = timetable.trip_count(),
            "loaded network bundle"
        );
        Ok(LoadedNetwork { catalog, timetable })
    }

    /// Lines of the trips calling at each stop id.
    fn lines_by_stop(&self) -> HashMap<&str, BTreeSet<LineId>> {
        let mut lines: HashMap<&str, BTreeSet<LineId>> = HashMap::new();
        for trip in &self.trips {
            let Ok(line) = LineId::parse(&trip.line) else {
                continue;
            };
            for st in &trip.stop_times {
                lines
                    .entry(st.stop_id.as_str())
                    .or_default()
                    .insert(line.clone());
            }
        }
        lines
    }
}

/// Read, parse and validate a bundle file.
pub fn load(path: &Path) -> Result<LoadedNetwork, LoadError> {
    NetworkBundle::from_path(path)?.into_network()
}
