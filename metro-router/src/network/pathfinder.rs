//! Structural path search.
//!
//! Finds several topologically distinct routes between two named stations.
//! The base search is Dijkstra over `(station record, current line)` states,
//! where boarding a different line than the one being ridden costs a fixed
//! penalty. Alternatives come from re-running the search with one edge of an
//! already-found route removed at a time.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, trace};

use crate::domain::{StructuralPath, StructuralSegment};

use super::{NetworkError, StationCatalog};

/// Default penalty added by the search each time the line changes.
pub const DEFAULT_CHANGE_PENALTY_SECS: i64 = 300;

/// Default penalty used when ordering the final candidate list.
pub const DEFAULT_RANKING_CHANGE_PENALTY_SECS: i64 = 600;

/// Default bound on stations visited by one path.
pub const DEFAULT_MAX_HOPS: usize = 50;

/// Tuning for the structural search.
#[derive(Debug, Clone)]
pub struct PathFinderConfig {
    /// Added to the edge cost when the next edge's line differs from the current one
    pub change_penalty: Duration,
    /// Per-change penalty when sorting the returned candidates
    pub ranking_change_penalty: Duration,
    /// Paths visiting more stations than this are discarded
    pub max_hops: usize,
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        Self {
            change_penalty: Duration::seconds(DEFAULT_CHANGE_PENALTY_SECS),
            ranking_change_penalty: Duration::seconds(DEFAULT_RANKING_CHANGE_PENALTY_SECS),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct State {
    cost: i64,
    node: usize,
    line: Option<usize>,
}

// Min-heap on cost. Ties compare the rest of the state so `Ord` agrees with
// `Eq` and pop order is deterministic.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
            .then_with(|| other.line.cmp(&self.line))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type StateKey = (usize, Option<usize>);

/// How a state was reached: the previous state and the edge ridden, if any
/// (platform moves within one stop ride no edge).
type Predecessor = (StateKey, Option<usize>);

/// A route found by one search, as edge indices into the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    links: Vec<usize>,
}

/// Enumerates distinct structural paths over a shared catalog.
#[derive(Debug, Clone)]
pub struct PathFinder {
    catalog: Arc<StationCatalog>,
    config: PathFinderConfig,
}

impl PathFinder {
    pub fn new(catalog: Arc<StationCatalog>, config: PathFinderConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PathFinderConfig {
        &self.config
    }

    /// Find up to `max_paths` distinct paths from `origin` to `destination`.
    ///
    /// Results are ordered by cost (nominal duration plus the ranking change
    /// penalty), ties broken by the sequence of boarding station names, so
    /// identical inputs always give identical output.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::UnknownStation` if either name is not in the
    /// catalog.
    pub fn find_paths(
        &self,
        origin: &str,
        destination: &str,
        max_paths: usize,
    ) -> Result<Vec<StructuralPath>, NetworkError> {
        let origins = self.catalog.resolve(origin)?;
        let destinations = self.catalog.resolve(destination)?;

        if origin == destination || max_paths == 0 {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut paths = Vec::new();

        for &from in origins {
            for &to in destinations {
                for route in self.k_routes(from, to, max_paths) {
                    // Routes from different records of one stop often coincide
                    if !seen.insert(route.links.clone()) {
                        continue;
                    }
                    match self.to_path(&route) {
                        Ok(path) => paths.push(path),
                        Err(e) => debug!(error = %e, "discarding malformed route"),
                    }
                }
            }
        }

        let mut keyed_seen = HashSet::new();
        paths.retain(|p: &StructuralPath| {
            let key: Vec<(String, String, String)> = p
                .key()
                .into_iter()
                .map(|(f, t, l)| (f.to_string(), t.to_string(), l.to_string()))
                .collect();
            keyed_seen.insert(key)
        });

        let penalty = self.config.ranking_change_penalty;
        paths.sort_by(|a, b| {
            let boardings = |p: &StructuralPath| -> Vec<String> {
                p.segments().iter().map(|s| s.from.clone()).collect()
            };
            a.cost(penalty)
                .cmp(&b.cost(penalty))
                .then_with(|| boardings(a).cmp(&boardings(b)))
        });
        paths.truncate(max_paths);

        debug!(origin, destination, found = paths.len(), "structural search complete");
        Ok(paths)
    }

    /// Cheapest route plus deviations, up to `max_paths` distinct routes.
    fn k_routes(&self, from: usize, to: usize, max_paths: usize) -> Vec<Route> {
        let Some(first) = self.search(from, to, &HashSet::new()) else {
            return Vec::new();
        };
        if !self.within_hops(&first) {
            trace!(hops = first.links.len() + 1, "cheapest route exceeds hop bound");
            return Vec::new();
        }

        let mut found = vec![first];
        let mut next_base = 0;

        while found.len() < max_paths && next_base < found.len() {
            let base = found[next_base].clone();
            next_base += 1;

            for &link in &base.links {
                if found.len() >= max_paths {
                    break;
                }
                let banned = HashSet::from([link]);
                let Some(route) = self.search(from, to, &banned) else {
                    continue;
                };
                if !self.within_hops(&route) {
                    trace!(hops = route.links.len() + 1, "deviation exceeds hop bound");
                    continue;
                }
                if !found.contains(&route) {
                    found.push(route);
                }
            }
        }

        found
    }

    /// Stations visited, counting the origin.
    fn within_hops(&self, route: &Route) -> bool {
        route.links.len() + 1 <= self.config.max_hops
    }

    /// Dijkstra from `from` to `to`, never riding a link in `banned`.
    fn search(&self, from: usize, to: usize, banned: &HashSet<usize>) -> Option<Route> {
        let penalty = self.config.change_penalty.num_seconds();
        let mut dist: HashMap<StateKey, i64> = HashMap::new();
        let mut prev: HashMap<StateKey, Predecessor> = HashMap::new();
        let mut done: HashSet<StateKey> = HashSet::new();
        let mut heap = BinaryHeap::new();

        dist.insert((from, None), 0);
        heap.push(State {
            cost: 0,
            node: from,
            line: None,
        });

        while let Some(State { cost, node, line }) = heap.pop() {
            let key = (node, line);
            if !done.insert(key) {
                continue;
            }
            if node == to {
                return Some(self.unwind(key, &prev));
            }

            let mut relax = |next: StateKey, next_cost: i64, via: Option<usize>| {
                if next_cost < *dist.get(&next).unwrap_or(&i64::MAX) {
                    dist.insert(next, next_cost);
                    prev.insert(next, (key, via));
                    heap.push(State {
                        cost: next_cost,
                        node: next.0,
                        line: next.1,
                    });
                }
            };

            // Moving between platforms of one stop keeps the current line
            for other in self.catalog.platforms(node) {
                relax((other, line), cost, None);
            }

            for &link_idx in self.catalog.outgoing(node) {
                if banned.contains(&link_idx) {
                    continue;
                }
                let link = self.catalog.link(link_idx);
                let change = match line {
                    Some(current) if current != link.line => penalty,
                    _ => 0,
                };
                relax((link.to, Some(link.line)), cost + link.secs + change, Some(link_idx));
            }
        }

        None
    }

    fn unwind(&self, goal: StateKey, prev: &HashMap<StateKey, Predecessor>) -> Route {
        let mut links = Vec::new();
        let mut key = goal;
        while let Some(&(before, via)) = prev.get(&key) {
            if let Some(link) = via {
                links.push(link);
            }
            key = before;
        }
        links.reverse();
        Route { links }
    }

    fn to_path(&self, route: &Route) -> Result<StructuralPath, crate::domain::DomainError> {
        let segments = route
            .links
            .iter()
            .map(|&idx| {
                let link = self.catalog.link(idx);
                let edge = self.catalog.edge(idx);
                StructuralSegment {
                    from: self.catalog.station_at(link.from).name.clone(),
                    to: self.catalog.station_at(link.to).name.clone(),
                    from_id: edge.from.clone(),
                    to_id: edge.to.clone(),
                    line: self.catalog.line(link.line).clone(),
                    travel_time: edge.travel_time,
                }
            })
            .collect();
        StructuralPath::new(segments)
    }
}
