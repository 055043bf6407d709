//! Shared fixtures for unit tests.
//!
//! The A-B-D network: line 1 runs A to B in 10 minutes, line 2 runs B to D
//! in 10 minutes, and B is the only interchange.
//!
//! - Line 1 leaves A at 05:30, then every 10 minutes from 05:45 to 23:45
//!   (08:05, 08:15, ...).
//! - Line 2 leaves B every 10 minutes from 05:30 to 23:50 (08:20, 08:30, ...).
//! - A 120 second transfer is recorded from line 1 to line 2 at B; the
//!   provider raises it to the 180 second floor.
//!
//! The multi-line network adds line 3 from A through E to a separate D
//! platform ("D3"), leaving A every 15 minutes from 06:00: 12 minutes to E,
//! 13 more to D.
//!
//! The dwell timetable has line 4 from P to R, leaving P every 10 minutes
//! from 06:00: 8 minutes to Q, a minute stood there, 9 more to R. Line 5
//! leaves R for S every 10 minutes from 06:05 and takes 5 minutes. No
//! transfer is recorded at R, so changing there takes the default.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::{LineId, ScheduleTime, Station, StationId};
use crate::network::{PathFinder, PathFinderConfig, StationCatalog};
use crate::planner::{PlannerConfig, RoutingEngine};
use crate::schedule::{CachedSchedule, ScheduleCacheConfig, StopCall, Timetable, TimetableBuilder};

fn id(s: &str) -> StationId {
    StationId::parse(s).unwrap()
}

fn line(s: &str) -> LineId {
    LineId::parse(s).unwrap()
}

fn station(i: &str, name: &str, lines: &[&str]) -> Station {
    Station::new(id(i), name, lines.iter().map(|l| line(l)))
}

pub(crate) fn abd_catalog() -> StationCatalog {
    let mut builder = StationCatalog::builder();
    builder
        .add_station(station("A", "A", &["1"]))
        .unwrap()
        .add_station(station("B", "B", &["1", "2"]))
        .unwrap()
        .add_station(station("D", "D", &["2"]).with_terminus(true))
        .unwrap();
    builder
        .connect_both(&id("A"), &id("B"), Duration::minutes(10), None)
        .unwrap()
        .connect_both(&id("B"), &id("D"), Duration::minutes(10), None)
        .unwrap();
    builder.build()
}

pub(crate) fn multi_line_catalog() -> StationCatalog {
    let mut builder = StationCatalog::builder();
    builder
        .add_station(station("A", "A", &["1", "3"]))
        .unwrap()
        .add_station(station("B", "B", &["1", "2"]))
        .unwrap()
        .add_station(station("D", "D", &["2"]))
        .unwrap()
        .add_station(station("E", "E", &["3"]))
        .unwrap()
        .add_station(station("D3", "D", &["3"]).with_terminus(true))
        .unwrap();
    builder
        .connect_both(&id("A"), &id("B"), Duration::minutes(10), None)
        .unwrap()
        .connect_both(&id("B"), &id("D"), Duration::minutes(10), None)
        .unwrap()
        .connect_both(&id("A"), &id("E"), Duration::minutes(12), None)
        .unwrap()
        .connect_both(&id("E"), &id("D3"), Duration::minutes(13), None)
        .unwrap();
    builder.build()
}

fn t(secs: u32) -> ScheduleTime {
    ScheduleTime::from_secs(secs)
}

fn hm(h: u32, m: u32) -> u32 {
    h * 3600 + m * 60
}

/// Add a trip calling at `stops` with `legs[i]` seconds between stop i and
/// stop i + 1, no dwell.
fn add_trip(builder: &mut TimetableBuilder, trip_id: String, line_id: &str, start: u32, stops: &[&str], legs: &[u32]) {
    add_dwelling_trip(builder, trip_id, line_id, start, stops, legs, 0);
}

/// Like `add_trip`, standing `dwell` seconds at every intermediate stop.
fn add_dwelling_trip(
    builder: &mut TimetableBuilder,
    trip_id: String,
    line_id: &str,
    start: u32,
    stops: &[&str],
    legs: &[u32],
    dwell: u32,
) {
    let mut clock = start;
    let mut calls = vec![StopCall::new(id(stops[0]), t(clock), t(clock))];
    let last = stops.len() - 1;
    for (i, (stop, leg)) in stops[1..].iter().zip(legs).enumerate() {
        clock += leg;
        let arrival = clock;
        if i + 1 < last {
            clock += dwell;
        }
        calls.push(StopCall::new(id(stop), t(arrival), t(clock)));
    }
    builder.trip(trip_id, line(line_id), calls).unwrap();
}

fn abd_trips(builder: &mut TimetableBuilder) {
    builder.stop(id("A"), "A").stop(id("B"), "B").stop(id("D"), "D");

    let mut line1_starts = vec![hm(5, 30)];
    line1_starts.extend((hm(5, 45)..=hm(23, 45)).step_by(600));
    for start in line1_starts {
        add_trip(builder, format!("L1-{}", t(start)), "1", start, &["A", "B"], &[600]);
    }

    for start in (hm(5, 30)..=hm(23, 50)).step_by(600) {
        add_trip(builder, format!("L2-{}", t(start)), "2", start, &["B", "D"], &[600]);
    }

    builder.transfer(id("B"), id("B"), Duration::seconds(120));
}

pub(crate) fn abd_timetable() -> Timetable {
    let mut builder = Timetable::builder("abd");
    abd_trips(&mut builder);
    builder.build()
}

pub(crate) fn multi_line_timetable() -> Timetable {
    let mut builder = Timetable::builder("multi");
    abd_trips(&mut builder);
    builder.stop(id("E"), "E").stop(id("D3"), "D");
    for start in (hm(6, 0)..=hm(23, 0)).step_by(900) {
        add_trip(&mut builder, format!("L3-{}", t(start)), "3", start, &["A", "E", "D3"], &[720, 780]);
    }
    builder.build()
}

pub(crate) fn dwell_timetable() -> Timetable {
    let mut builder = Timetable::builder("dwell");
    builder
        .stop(id("P"), "P")
        .stop(id("Q"), "Q")
        .stop(id("R"), "R")
        .stop(id("S"), "S");
    for start in (hm(6, 0)..=hm(22, 0)).step_by(600) {
        add_dwelling_trip(&mut builder, format!("L4-{}", t(start)), "4", start, &["P", "Q", "R"], &[480, 540], 60);
    }
    for start in (hm(6, 5)..=hm(22, 55)).step_by(600) {
        add_trip(&mut builder, format!("L5-{}", t(start)), "5", start, &["R", "S"], &[300]);
    }
    builder.build()
}

pub(crate) type FixtureEngine = RoutingEngine<CachedSchedule<Timetable>>;

fn engine(catalog: StationCatalog, timetable: Timetable, config: PlannerConfig) -> FixtureEngine {
    let provider = CachedSchedule::new(timetable, ScheduleCacheConfig::default());
    let finder = PathFinder::new(Arc::new(catalog), PathFinderConfig::from(&config));
    RoutingEngine::new(finder, Arc::new(provider), config)
}

pub(crate) fn abd_engine() -> FixtureEngine {
    engine(abd_catalog(), abd_timetable(), PlannerConfig::default())
}

pub(crate) fn abd_engine_with(config: PlannerConfig) -> FixtureEngine {
    engine(abd_catalog(), abd_timetable(), config)
}

pub(crate) fn multi_line_engine() -> FixtureEngine {
    multi_line_engine_with(PlannerConfig::default())
}

pub(crate) fn multi_line_engine_with(config: PlannerConfig) -> FixtureEngine {
    engine(multi_line_catalog(), multi_line_timetable(), config)
}
