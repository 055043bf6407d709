//! The routing engine: structural search, then timetable evaluation, then
//! ranking.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use futures::future::join_all;
use tracing::{debug, info};

use crate::domain::{ServiceAvailability, StructuralPath, TemporalItinerary};
use crate::network::PathFinder;
use crate::schedule::ScheduleProvider;

use super::availability;
use super::config::PlannerConfig;
use super::error::RoutingError;
use super::evaluator::Evaluator;
use super::rank::{Criterion, Ranker, deduplicate};

/// Plans itineraries between named stations.
///
/// Holds the immutable network and a shared schedule provider; each call
/// works on its own candidates, so one engine serves concurrent requests.
pub struct RoutingEngine<P> {
    finder: PathFinder,
    provider: Arc<P>,
    ranker: Ranker,
    config: PlannerConfig,
}

impl<P: ScheduleProvider> RoutingEngine<P> {
    pub fn new(finder: PathFinder, provider: Arc<P>, config: PlannerConfig) -> Self {
        Self {
            finder,
            provider,
            ranker: Ranker::new(config.wait_weight),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Station display names in the network, sorted.
    pub fn stations(&self) -> Vec<&str> {
        self.finder.catalog().names().collect()
    }

    fn evaluator(&self) -> Evaluator<'_, P> {
        Evaluator::new(self.provider.as_ref(), self.config.continuation_tolerance())
    }

    fn ensure_known(&self, station: &str) -> Result<(), RoutingError> {
        if self.finder.catalog().contains(station) {
            Ok(())
        } else {
            Err(RoutingError::UnknownStation(station.to_string()))
        }
    }

    /// Whether `station` has service at `at`, with a suggested time if not.
    pub async fn check_availability(
        &self,
        station: &str,
        at: NaiveDateTime,
    ) -> Result<ServiceAvailability, RoutingError> {
        self.ensure_known(station)?;
        Ok(availability::check_availability(self.provider.as_ref(), station, at).await?)
    }

    /// Best itinerary leaving `origin` no earlier than `depart_at`.
    ///
    /// If the origin is closed at `depart_at`, evaluation starts from the
    /// suggested opening time instead; the returned itinerary still measures
    /// its duration from `depart_at`. `Ok(None)` means no candidate could be
    /// placed on the timetable.
    pub async fn plan_forward(
        &self,
        origin: &str,
        destination: &str,
        depart_at: NaiveDateTime,
        max_candidates: usize,
        max_wait: Duration,
    ) -> Result<Option<TemporalItinerary>, RoutingError> {
        if max_candidates == 0 {
            return Err(RoutingError::InvalidRequest(
                "max_candidates must be at least 1".to_string(),
            ));
        }

        let paths = self.finder.find_paths(origin, destination, max_candidates)?;
        let found = self.forward_candidates(&paths, depart_at, max_wait).await?;
        let best = self
            .ranker
            .rank(found, Criterion::WeightedDuration)
            .into_iter()
            .next();

        debug!(origin, destination, %depart_at, found = best.is_some(), "planned forward");
        Ok(best)
    }

    /// Best itinerary reaching `destination` by `arrive_by`, leaving as late
    /// as possible.
    pub async fn plan_backward(
        &self,
        origin: &str,
        destination: &str,
        arrive_by: NaiveDateTime,
        max_candidates: usize,
        max_wait: Duration,
    ) -> Result<Option<TemporalItinerary>, RoutingError> {
        Ok(self
            .plan_backward_all(origin, destination, arrive_by, max_candidates, max_wait)
            .await?
            .into_iter()
            .next())
    }

    /// Every itinerary reaching `destination` by `arrive_by`, latest
    /// departure first.
    ///
    /// Empty when `arrive_by` precedes the first departure at the origin or
    /// the origin has no service that day.
    pub async fn plan_backward_all(
        &self,
        origin: &str,
        destination: &str,
        arrive_by: NaiveDateTime,
        max_candidates: usize,
        max_wait: Duration,
    ) -> Result<Vec<TemporalItinerary>, RoutingError> {
        if max_candidates == 0 {
            return Err(RoutingError::InvalidRequest(
                "max_candidates must be at least 1".to_string(),
            ));
        }

        let paths = self.finder.find_paths(origin, destination, max_candidates)?;
        if paths.is_empty() {
            debug!(origin, destination, "no structural path");
            return Ok(Vec::new());
        }

        let availability =
            availability::check_availability(self.provider.as_ref(), origin, arrive_by).await?;
        let reachable = availability.is_available
            || availability
                .first_departure
                .is_some_and(|first| first <= arrive_by);
        if !reachable {
            info!(origin, %arrive_by, message = %availability.message, "arrive-by outside service hours");
            return Ok(Vec::new());
        }

        let evaluator = self.evaluator();
        let outcomes = join_all(
            paths
                .iter()
                .map(|path| evaluator.evaluate_backward(path, arrive_by, max_wait)),
        )
        .await;

        let mut found = Vec::new();
        for itinerary in outcomes.into_iter().filter_map(Result::transpose) {
            let itinerary = itinerary?;
            if itinerary.arrival_time() > arrive_by {
                debug!(arrival = %itinerary.arrival_time(), %arrive_by, "discarding late arrival");
                continue;
            }
            found.push(itinerary);
        }
        debug!(candidates = paths.len(), feasible = found.len(), "evaluated backward");

        Ok(self
            .ranker
            .rank(deduplicate(found), Criterion::LatestDeparture))
    }

    /// Up to `count` distinct itineraries leaving from `anchor`, best first
    /// under `criterion`. Without a count, the configured
    /// `default_alternatives` are returned.
    pub async fn plan_alternatives(
        &self,
        origin: &str,
        destination: &str,
        anchor: NaiveDateTime,
        count: Option<usize>,
        criterion: Criterion<'_>,
    ) -> Result<Vec<TemporalItinerary>, RoutingError> {
        let count = count.unwrap_or(self.config.default_alternatives);
        if count == 0 {
            return Ok(Vec::new());
        }

        let wanted = count.saturating_mul(self.config.alternatives_fanout);
        let paths = self.finder.find_paths(origin, destination, wanted)?;
        let found = self
            .forward_candidates(&paths, anchor, self.config.max_wait())
            .await?;

        let mut ranked = self.ranker.rank(deduplicate(found), criterion);
        ranked.truncate(count);
        debug!(origin, destination, ?criterion, returned = ranked.len(), "planned alternatives");
        Ok(ranked)
    }

    /// Evaluate every path forward, all at once, substituting the suggested
    /// opening time when the origin is closed at `depart_at`.
    async fn forward_candidates(
        &self,
        paths: &[StructuralPath],
        depart_at: NaiveDateTime,
        max_wait: Duration,
    ) -> Result<Vec<TemporalItinerary>, RoutingError> {
        let Some(origin) = paths.first().map(|p| p.origin()) else {
            return Ok(Vec::new());
        };

        let availability =
            availability::check_availability(self.provider.as_ref(), origin, depart_at).await?;
        let start = match availability.suggested_alternative {
            Some(suggested) if !availability.is_available => {
                info!(origin, %depart_at, %suggested, "origin closed, evaluating from suggested time");
                suggested
            }
            _ => depart_at,
        };

        let evaluator = self.evaluator();
        let outcomes = join_all(
            paths
                .iter()
                .map(|path| evaluator.evaluate_forward(path, start, max_wait)),
        )
        .await;

        let mut found = Vec::new();
        for itinerary in outcomes.into_iter().filter_map(Result::transpose) {
            let itinerary = itinerary?;
            if start == depart_at {
                found.push(itinerary);
                continue;
            }
            match itinerary.clone().with_requested_departure(depart_at) {
                Ok(anchored) => found.push(anchored),
                Err(e) => {
                    debug!(error = %e, "keeping itinerary anchored at suggested time");
                    found.push(itinerary);
                }
            }
        }
        debug!(candidates = paths.len(), feasible = found.len(), "evaluated forward");
        Ok(found)
    }
}
