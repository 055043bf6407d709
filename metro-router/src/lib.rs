//! Metro route planner.
//!
//! Answers: "how do I get from this station to that one, leaving at (or
//! arriving by) this time?" Candidate routes are found on the station
//! network, then placed on the timetable and ranked.

pub mod domain;
pub mod loader;
pub mod network;
pub mod planner;
pub mod schedule;

#[cfg(test)]
mod testing;
