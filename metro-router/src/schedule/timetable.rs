//! In-memory timetable: trips as ordered stop calls.
//!
//! Stop times are kept relative to the service day (`ScheduleTime`) and only
//! anchored to a calendar date when queried, so a trip leaving at "24:40:00"
//! on the 2nd is reported at 00:40 on the 3rd.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Duration, NaiveDate};

use crate::domain::{Departure, LineId, ScheduleTime, StationId, TripRun};

use super::{ScheduleError, ScheduleSource};

/// One stop of a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCall {
    pub stop: StationId,
    pub arrival: ScheduleTime,
    pub departure: ScheduleTime,
}

impl StopCall {
    pub fn new(stop: StationId, arrival: ScheduleTime, departure: ScheduleTime) -> Self {
        Self {
            stop,
            arrival,
            departure,
        }
    }
}

/// A vehicle run along a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: String,
    pub line: LineId,
    pub calls: Vec<StopCall>,
}

/// Minimum walking time between two stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: StationId,
    pub to: StationId,
    pub min_time: Duration,
}

/// Trips, stop names and transfer records held in memory.
#[derive(Debug, Default)]
pub struct Timetable {
    name: String,
    trips: Vec<Trip>,
    stop_names: HashMap<StationId, String>,
    trips_by_line: HashMap<LineId, Vec<usize>>,
    stops_by_line: HashMap<LineId, HashSet<StationId>>,
    transfers: Vec<TransferRecord>,
}

impl Timetable {
    pub fn builder(name: impl Into<String>) -> TimetableBuilder {
        TimetableBuilder {
            timetable: Timetable {
                name: name.into(),
                ..Timetable::default()
            },
        }
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    fn is_at(&self, stop: &StationId, station: &str) -> bool {
        self.stop_names.get(stop).is_some_and(|n| n == station)
    }

    fn line_trips<'a>(&'a self, line: &LineId) -> impl Iterator<Item = &'a Trip> + 'a {
        self.trips_by_line
            .get(line)
            .into_iter()
            .flatten()
            .map(|&idx| &self.trips[idx])
    }

    /// Index pairs `(i, j)` with `i < j`, the first call at `from` and the
    /// first later call at `to`.
    fn run_between(&self, trip: &Trip, from: &str, to: &str) -> Option<(usize, usize)> {
        let i = trip.calls.iter().position(|c| self.is_at(&c.stop, from))?;
        let j = trip.calls[i + 1..]
            .iter()
            .position(|c| self.is_at(&c.stop, to))?;
        Some((i, i + 1 + j))
    }
}

impl ScheduleSource for Timetable {
    fn name(&self) -> &str {
        &self.name
    }

    fn departures(
        &self,
        station: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, ScheduleError> {
        let mut departures: Vec<Departure> = self
            .line_trips(line)
            .flat_map(|trip| {
                let last = trip.calls.len() - 1;
                trip.calls
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| self.is_at(&c.stop, station))
                    .map(move |(i, c)| Departure {
                        departure: c.departure.on(date),
                        arrival: c.arrival.on(date),
                        trip_id: trip.trip_id.clone(),
                        terminates: i == last,
                    })
            })
            .collect();
        departures.sort_by(|a, b| {
            a.departure
                .cmp(&b.departure)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
        });
        Ok(departures)
    }

    fn trip_runs(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> Result<Vec<TripRun>, ScheduleError> {
        let mut runs: Vec<TripRun> = self
            .line_trips(line)
            .filter_map(|trip| {
                let (i, j) = self.run_between(trip, from, to)?;
                Some(TripRun {
                    trip_id: trip.trip_id.clone(),
                    departure: trip.calls[i].departure.on(date),
                    arrival: trip.calls[j].arrival.on(date),
                })
            })
            .collect();
        runs.sort_by(|a, b| {
            a.departure
                .cmp(&b.departure)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
        });
        Ok(runs)
    }

    fn transfer_record(
        &self,
        station: &str,
        from_line: &LineId,
        to_line: &LineId,
    ) -> Result<Option<Duration>, ScheduleError> {
        let (Some(from_stops), Some(to_stops)) = (
            self.stops_by_line.get(from_line),
            self.stops_by_line.get(to_line),
        ) else {
            return Ok(None);
        };

        Ok(self
            .transfers
            .iter()
            .filter(|t| self.is_at(&t.from, station) && self.is_at(&t.to, station))
            .filter(|t| from_stops.contains(&t.from) && to_stops.contains(&t.to))
            .map(|t| t.min_time)
            .max())
    }

    fn travel_samples(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
    ) -> Result<Vec<Duration>, ScheduleError> {
        Ok(self
            .line_trips(line)
            .filter_map(|trip| {
                let (i, j) = self.run_between(trip, from, to)?;
                Some(trip.calls[j].arrival.since(trip.calls[i].departure))
            })
            .collect())
    }

    fn lines(&self, station: &str) -> Result<Vec<LineId>, ScheduleError> {
        let lines: BTreeSet<LineId> = self
            .stops_by_line
            .iter()
            .filter(|(_, stops)| stops.iter().any(|s| self.is_at(s, station)))
            .map(|(line, _)| line.clone())
            .collect();
        Ok(lines.into_iter().collect())
    }
}

/// Validates and indexes timetable data.
#[derive(Debug)]
pub struct TimetableBuilder {
    timetable: Timetable,
}

impl TimetableBuilder {
    /// Register a stop and the station display name it belongs to.
    pub fn stop(&mut self, id: StationId, station: impl Into<String>) -> &mut Self {
        self.timetable.stop_names.insert(id, station.into());
        self
    }

    /// Add a trip.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the trip has fewer than two calls, calls an
    /// unregistered stop, or goes back in time.
    pub fn trip(
        &mut self,
        trip_id: impl Into<String>,
        line: LineId,
        calls: Vec<StopCall>,
    ) -> Result<&mut Self, ScheduleError> {
        let trip_id = trip_id.into();
        if calls.len() < 2 {
            return Err(ScheduleError::InvalidData(format!(
                "trip {trip_id} has fewer than two stops"
            )));
        }

        let mut last = ScheduleTime::from_secs(0);
        for call in &calls {
            if !self.timetable.stop_names.contains_key(&call.stop) {
                return Err(ScheduleError::InvalidData(format!(
                    "trip {trip_id} calls at unknown stop {}",
                    call.stop
                )));
            }
            if call.arrival < last || call.departure < call.arrival {
                return Err(ScheduleError::InvalidData(format!(
                    "trip {trip_id} goes back in time at stop {}",
                    call.stop
                )));
            }
            last = call.departure;
        }

        let idx = self.timetable.trips.len();
        let stops = self
            .timetable
            .stops_by_line
            .entry(line.clone())
            .or_default();
        stops.extend(calls.iter().map(|c| c.stop.clone()));
        self.timetable
            .trips_by_line
            .entry(line.clone())
            .or_default()
            .push(idx);
        self.timetable.trips.push(Trip {
            trip_id,
            line,
            calls,
        });
        Ok(self)
    }

    /// Record a minimum transfer time between two stops.
    pub fn transfer(&mut self, from: StationId, to: StationId, min_time: Duration) -> &mut Self {
        self.timetable.transfers.push(TransferRecord { from, to, min_time });
        self
    }

    pub fn build(self) -> Timetable {
        self.timetable
    }
}
