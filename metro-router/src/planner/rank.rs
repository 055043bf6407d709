//! Itinerary ranking.
//!
//! Orders timed itineraries best-first under a chosen criterion so the
//! engine can pick one or present several.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::domain::{LineId, TemporalItinerary};

/// Weight of total wait time in the default score.
pub const DEFAULT_WAIT_WEIGHT: f64 = 0.5;

/// Supplies an emissions figure (any unit, lower is better) per itinerary.
pub trait EmissionsEstimator: Send + Sync {
    fn estimate(&self, itinerary: &TemporalItinerary) -> f64;
}

impl<F> EmissionsEstimator for F
where
    F: Fn(&TemporalItinerary) -> f64 + Send + Sync,
{
    fn estimate(&self, itinerary: &TemporalItinerary) -> f64 {
        self(itinerary)
    }
}

/// What "best" means.
#[derive(Clone, Copy, Default)]
pub enum Criterion<'a> {
    /// Lowest weighted score, see [`Ranker::score`]
    #[default]
    WeightedDuration,
    /// Latest first boarding, then least waiting, then shortest. Used for
    /// arrive-by queries so the traveller idles as little as possible.
    LatestDeparture,
    /// Lowest estimated emissions, shortest duration on ties
    Emissions(&'a dyn EmissionsEstimator),
}

impl std::fmt::Debug for Criterion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeightedDuration => write!(f, "WeightedDuration"),
            Self::LatestDeparture => write!(f, "LatestDeparture"),
            Self::Emissions(_) => write!(f, "Emissions"),
        }
    }
}

/// Sorts itineraries best-first.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    wait_weight: f64,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_WEIGHT)
    }
}

impl Ranker {
    pub fn new(wait_weight: f64) -> Self {
        Self { wait_weight }
    }

    /// Weighted score in seconds, lower is better.
    ///
    /// `total_duration + Σ(transfer + wait over segments entered by a
    /// transfer) + wait_weight * total_wait`. A nominally fast itinerary
    /// with long or frequent changes scores worse than its raw duration.
    pub fn score(&self, itinerary: &TemporalItinerary) -> f64 {
        let change_cost: i64 = itinerary
            .segments()
            .iter()
            .filter(|s| s.transfer_time() > chrono::Duration::zero())
            .map(|s| (s.transfer_time() + s.wait_time()).num_seconds())
            .sum();
        let duration = itinerary.total_duration().num_seconds();
        let wait = itinerary.total_wait_time().num_seconds();

        (duration + change_cost) as f64 + self.wait_weight * wait as f64
    }

    /// Sort `itineraries` best-first. Stable: equal keys keep input order.
    pub fn rank(
        &self,
        itineraries: Vec<TemporalItinerary>,
        criterion: Criterion<'_>,
    ) -> Vec<TemporalItinerary> {
        match criterion {
            Criterion::WeightedDuration => by_float(itineraries, |it| self.score(it), |_| ()),
            Criterion::LatestDeparture => {
                let mut itineraries = itineraries;
                itineraries.sort_by_key(|it| {
                    (
                        Reverse(it.first_boarding()),
                        it.total_wait_time(),
                        it.total_duration(),
                    )
                });
                itineraries
            }
            Criterion::Emissions(estimator) => by_float(
                itineraries,
                |it| estimator.estimate(it),
                |it| it.total_duration(),
            ),
        }
    }
}

/// Stable sort on a float key, then `tie`.
fn by_float<K: Ord>(
    itineraries: Vec<TemporalItinerary>,
    key: impl Fn(&TemporalItinerary) -> f64,
    tie: impl Fn(&TemporalItinerary) -> K,
) -> Vec<TemporalItinerary> {
    let mut keyed: Vec<(f64, TemporalItinerary)> =
        itineraries.into_iter().map(|it| (key(&it), it)).collect();
    keyed.sort_by(|(a, x), (b, y)| a.total_cmp(b).then_with(|| tie(x).cmp(&tie(y))));
    keyed.into_iter().map(|(_, it)| it).collect()
}

/// Drop itineraries that ride exactly the same trips at the same times as
/// an earlier one. The first occurrence wins.
pub fn deduplicate(itineraries: Vec<TemporalItinerary>) -> Vec<TemporalItinerary> {
    if itineraries.len() <= 1 {
        return itineraries;
    }

    let mut seen: HashSet<Vec<(String, String, LineId, NaiveDateTime)>> = HashSet::new();
    itineraries
        .into_iter()
        .filter(|it| {
            let key = it
                .segments()
                .iter()
                .map(|s| {
                    (
                        s.from().to_string(),
                        s.to().to_string(),
                        s.line().clone(),
                        s.departure_time(),
                    )
                })
                .collect();
            seen.insert(key)
        })
        .collect()
}
