//! Configuration for the routing engine.

use chrono::Duration;
use tracing::warn;

use crate::network::{
    DEFAULT_CHANGE_PENALTY_SECS, DEFAULT_MAX_HOPS, DEFAULT_RANKING_CHANGE_PENALTY_SECS,
    PathFinderConfig,
};

/// Configuration parameters for route planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Penalty per line change in the structural search (seconds).
    pub change_penalty_secs: i64,

    /// Penalty per line change when ordering structural candidates (seconds).
    pub ranking_change_penalty_secs: i64,

    /// Maximum stations visited by one structural path.
    pub max_path_hops: usize,

    /// Structural candidates evaluated per depart-at or arrive-by query.
    pub max_structural_paths: usize,

    /// Alternatives returned when the caller doesn't say.
    pub default_alternatives: usize,

    /// Longest acceptable wait before any one segment (seconds).
    pub max_wait_secs: i64,

    /// How far a scheduled departure may sit from the previous arrival and
    /// still count as staying on the same vehicle (seconds).
    pub continuation_tolerance_secs: i64,

    /// Structural candidates searched per requested alternative.
    pub alternatives_fanout: usize,

    /// Weight of total wait time in the default ranking score.
    pub wait_weight: f64,
}

impl PlannerConfig {
    /// Create a configuration with the given search bounds and the remaining
    /// fields at their defaults.
    pub fn new(max_structural_paths: usize, max_wait_secs: i64) -> Self {
        Self {
            max_structural_paths,
            max_wait_secs,
            ..Self::default()
        }
    }

    /// Defaults overridden by environment variables, where set and valid.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `ROUTER_CHANGE_PENALTY_SECS` | `change_penalty_secs` |
    /// | `ROUTER_RANKING_CHANGE_PENALTY_SECS` | `ranking_change_penalty_secs` |
    /// | `ROUTER_MAX_PATH_HOPS` | `max_path_hops` |
    /// | `TEMPORAL_MAX_STRUCTURAL_PATHS` | `max_structural_paths` |
    /// | `TEMPORAL_DEFAULT_MAX_PATHS` | `default_alternatives` |
    /// | `TEMPORAL_DEFAULT_MAX_WAIT_TIME` | `max_wait_secs` |
    /// | `ROUTER_CONTINUATION_TOLERANCE_SECS` | `continuation_tolerance_secs` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        override_from(&lookup, "ROUTER_CHANGE_PENALTY_SECS", &mut config.change_penalty_secs);
        override_from(
            &lookup,
            "ROUTER_RANKING_CHANGE_PENALTY_SECS",
            &mut config.ranking_change_penalty_secs,
        );
        override_from(&lookup, "ROUTER_MAX_PATH_HOPS", &mut config.max_path_hops);
        override_from(
            &lookup,
            "TEMPORAL_MAX_STRUCTURAL_PATHS",
            &mut config.max_structural_paths,
        );
        override_from(&lookup, "TEMPORAL_DEFAULT_MAX_PATHS", &mut config.default_alternatives);
        override_from(&lookup, "TEMPORAL_DEFAULT_MAX_WAIT_TIME", &mut config.max_wait_secs);
        override_from(
            &lookup,
            "ROUTER_CONTINUATION_TOLERANCE_SECS",
            &mut config.continuation_tolerance_secs,
        );
        config
    }

    /// Returns the structural change penalty as a Duration.
    pub fn change_penalty(&self) -> Duration {
        Duration::seconds(self.change_penalty_secs)
    }

    /// Returns the candidate ordering change penalty as a Duration.
    pub fn ranking_change_penalty(&self) -> Duration {
        Duration::seconds(self.ranking_change_penalty_secs)
    }

    /// Returns the maximum wait as a Duration.
    pub fn max_wait(&self) -> Duration {
        Duration::seconds(self.max_wait_secs)
    }

    /// Returns the continuation tolerance as a Duration.
    pub fn continuation_tolerance(&self) -> Duration {
        Duration::seconds(self.continuation_tolerance_secs)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            change_penalty_secs: DEFAULT_CHANGE_PENALTY_SECS,
            ranking_change_penalty_secs: DEFAULT_RANKING_CHANGE_PENALTY_SECS,
            max_path_hops: DEFAULT_MAX_HOPS,
            max_structural_paths: 10,
            default_alternatives: 3,
            max_wait_secs: 30 * 60,
            continuation_tolerance_secs: 120,
            alternatives_fanout: 10,
            wait_weight: 0.5,
        }
    }
}

impl From<&PlannerConfig> for PathFinderConfig {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            change_penalty: config.change_penalty(),
            ranking_change_penalty: config.ranking_change_penalty(),
            max_hops: config.max_path_hops,
        }
    }
}

fn override_from<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *field = value,
        Err(_) => warn!(key, value = %raw, "ignoring unparseable configuration value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.change_penalty_secs, 300);
        assert_eq!(config.ranking_change_penalty_secs, 600);
        assert_eq!(config.max_path_hops, 50);
        assert_eq!(config.max_structural_paths, 10);
        assert_eq!(config.default_alternatives, 3);
        assert_eq!(config.max_wait_secs, 1800);
        assert_eq!(config.continuation_tolerance_secs, 120);
        assert_eq!(config.alternatives_fanout, 10);
    }

    #[test]
    fn duration_methods() {
        let config = PlannerConfig::default();

        assert_eq!(config.change_penalty(), Duration::minutes(5));
        assert_eq!(config.ranking_change_penalty(), Duration::minutes(10));
        assert_eq!(config.max_wait(), Duration::minutes(30));
        assert_eq!(config.continuation_tolerance(), Duration::minutes(2));
    }

    #[test]
    fn custom_config() {
        let config = PlannerConfig::new(4, 600);

        assert_eq!(config.max_structural_paths, 4);
        assert_eq!(config.max_wait_secs, 600);
        assert_eq!(config.default_alternatives, 3);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("TEMPORAL_DEFAULT_MAX_WAIT_TIME", "900"),
            ("TEMPORAL_MAX_STRUCTURAL_PATHS", " 5 "),
            ("ROUTER_CHANGE_PENALTY_SECS", "not a number"),
        ]);
        let config = PlannerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.max_wait_secs, 900);
        assert_eq!(config.max_structural_paths, 5);
        // Unparseable values keep the default
        assert_eq!(config.change_penalty_secs, 300);
    }

    #[test]
    fn path_finder_config_follows_planner() {
        let config = PlannerConfig {
            change_penalty_secs: 120,
            max_path_hops: 7,
            ..PlannerConfig::default()
        };
        let finder = PathFinderConfig::from(&config);

        assert_eq!(finder.change_penalty, Duration::minutes(2));
        assert_eq!(finder.ranking_change_penalty, Duration::minutes(10));
        assert_eq!(finder.max_hops, 7);
    }
}
