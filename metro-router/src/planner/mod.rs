//! Time-dependent route planning.
//!
//! Answers "how do I get from this station to that one, leaving at (or
//! arriving by) this time?". Candidate routes come from the structural path
//! finder; each is placed on the timetable by the `Evaluator`, forward from
//! a departure time or backward from an arrival deadline, and the feasible
//! itineraries are ordered by the `Ranker`.

mod availability;
mod backward;
mod config;
mod engine;
mod error;
mod evaluator;
mod forward;
mod rank;

pub use availability::check_availability;
pub use config::PlannerConfig;
pub use engine::RoutingEngine;
pub use error::RoutingError;
pub use evaluator::{Evaluator, Rejection};
pub use rank::{Criterion, DEFAULT_WAIT_WEIGHT, EmissionsEstimator, Ranker, deduplicate};
