//! Caching schedule provider.
//!
//! Every `ScheduleProvider` query is cached per key. Misses load from the
//! wrapped `ScheduleSource` through `try_get_with`, so concurrent misses on
//! one key run a single load and share its result (or its error).
//!
//! The source sits behind a read/write lock. Queries hold the read side for
//! the whole load-and-insert, and `reload`/`clear` take the write side before
//! invalidating, so no reader ever sees entries from two source generations.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{Departure, LineId, TripRun};

use super::{ScheduleError, ScheduleProvider, ScheduleSource};

/// Transfer time assumed when no record exists for a station.
pub const DEFAULT_TRANSFER_SECS: i64 = 300;

/// Recorded transfers shorter than this are raised to it.
pub const MIN_TRANSFER_SECS: i64 = 180;

type SchedulesKey = (String, LineId, NaiveDate);
type RunsKey = (String, String, LineId, NaiveDate);
type TransferKey = (String, LineId, LineId);
type TravelKey = (String, String, LineId);

/// Configuration for the schedule cache.
#[derive(Debug, Clone)]
pub struct ScheduleCacheConfig {
    /// TTL for cached entries.
    pub ttl: StdDuration,

    /// Maximum number of entries per cache.
    pub max_capacity: u64,

    /// Transfer time when the source has no record.
    pub default_transfer_secs: i64,

    /// Floor applied to recorded transfer times.
    pub min_transfer_secs: i64,
}

impl Default for ScheduleCacheConfig {
    fn default() -> Self {
        Self {
            ttl: StdDuration::from_secs(60 * 60),
            max_capacity: 10_000,
            default_transfer_secs: DEFAULT_TRANSFER_SECS,
            min_transfer_secs: MIN_TRANSFER_SECS,
        }
    }
}

impl ScheduleCacheConfig {
    pub fn default_transfer(&self) -> Duration {
        Duration::seconds(self.default_transfer_secs)
    }

    pub fn min_transfer(&self) -> Duration {
        Duration::seconds(self.min_transfer_secs)
    }
}

fn build_cache<K, V>(config: &ScheduleCacheConfig) -> MokaCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    MokaCache::builder()
        .time_to_live(config.ttl)
        .max_capacity(config.max_capacity)
        .build()
}

/// A `ScheduleProvider` caching lookups against a swappable source.
pub struct CachedSchedule<S> {
    source: RwLock<Arc<S>>,
    schedules: MokaCache<SchedulesKey, Arc<Vec<Departure>>>,
    runs: MokaCache<RunsKey, Arc<Vec<TripRun>>>,
    transfers: MokaCache<TransferKey, Duration>,
    travel_times: MokaCache<TravelKey, Option<Duration>>,
    lines: MokaCache<String, Arc<Vec<LineId>>>,
    config: ScheduleCacheConfig,
}

impl<S: ScheduleSource + 'static> CachedSchedule<S> {
    /// Create a new cached provider.
    pub fn new(source: S, config: ScheduleCacheConfig) -> Self {
        Self {
            source: RwLock::new(Arc::new(source)),
            schedules: build_cache(&config),
            runs: build_cache(&config),
            transfers: build_cache(&config),
            travel_times: build_cache(&config),
            lines: build_cache(&config),
            config,
        }
    }

    pub fn config(&self) -> &ScheduleCacheConfig {
        &self.config
    }

    /// Drop every cached entry. The next query of each key reloads it.
    pub async fn clear(&self) {
        let _guard = self.source.write().await;
        self.invalidate_all();
        info!("schedule cache cleared");
    }

    /// Replace the source and drop every entry loaded from the old one.
    ///
    /// Queries already running finish against the old source; queries
    /// starting after this returns see only the new one.
    pub async fn reload(&self, source: S) {
        let mut guard = self.source.write().await;
        let name = source.name().to_string();
        *guard = Arc::new(source);
        self.invalidate_all();
        info!(source = %name, "schedule source reloaded");
    }

    /// Total cached entries across all queries (for monitoring).
    ///
    /// Approximate: moka applies pending writes lazily.
    pub fn entry_count(&self) -> u64 {
        self.schedules.entry_count()
            + self.runs.entry_count()
            + self.transfers.entry_count()
            + self.travel_times.entry_count()
            + self.lines.entry_count()
    }

    fn invalidate_all(&self) {
        self.schedules.invalidate_all();
        self.runs.invalidate_all();
        self.transfers.invalidate_all();
        self.travel_times.invalidate_all();
        self.lines.invalidate_all();
    }
}

/// moka shares a failed load's error across waiters as `Arc<E>`.
fn unshare(e: Arc<ScheduleError>) -> ScheduleError {
    Arc::unwrap_or_clone(e)
}

impl<S: ScheduleSource + 'static> ScheduleProvider for CachedSchedule<S> {
    async fn station_schedules(
        &self,
        station: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> Result<Arc<Vec<Departure>>, ScheduleError> {
        let source = self.source.read().await;
        let key = (station.to_string(), line.clone(), date);
        self.schedules
            .try_get_with(key, async {
                let departures = source.departures(station, line, date)?;
                debug!(
                    station,
                    line = %line,
                    %date,
                    count = departures.len(),
                    "loaded station schedules"
                );
                Ok::<_, ScheduleError>(Arc::new(departures))
            })
            .await
            .map_err(unshare)
    }

    async fn trip_runs(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
        date: NaiveDate,
    ) -> Result<Arc<Vec<TripRun>>, ScheduleError> {
        let source = self.source.read().await;
        let key = (from.to_string(), to.to_string(), line.clone(), date);
        self.runs
            .try_get_with(key, async {
                let runs = source.trip_runs(from, to, line, date)?;
                debug!(from, to, line = %line, %date, count = runs.len(), "loaded trip runs");
                Ok::<_, ScheduleError>(Arc::new(runs))
            })
            .await
            .map_err(unshare)
    }

    async fn transfer_time(
        &self,
        station: &str,
        from_line: &LineId,
        to_line: &LineId,
    ) -> Result<Duration, ScheduleError> {
        if from_line == to_line {
            return Ok(Duration::zero());
        }

        let source = self.source.read().await;
        let key = (station.to_string(), from_line.clone(), to_line.clone());
        self.transfers
            .try_get_with(key, async {
                let transfer = match source.transfer_record(station, from_line, to_line)? {
                    Some(recorded) => recorded.max(self.config.min_transfer()),
                    None => self.config.default_transfer(),
                };
                debug!(
                    station,
                    from_line = %from_line,
                    to_line = %to_line,
                    secs = transfer.num_seconds(),
                    "loaded transfer time"
                );
                Ok::<_, ScheduleError>(transfer)
            })
            .await
            .map_err(unshare)
    }

    async fn representative_travel_time(
        &self,
        from: &str,
        to: &str,
        line: &LineId,
    ) -> Result<Option<Duration>, ScheduleError> {
        let source = self.source.read().await;
        let key = (from.to_string(), to.to_string(), line.clone());
        self.travel_times
            .try_get_with(key, async {
                let mut samples = source.travel_samples(from, to, line)?;
                samples.sort();
                Ok::<_, ScheduleError>(samples.get(samples.len() / 2).copied())
            })
            .await
            .map_err(unshare)
    }

    async fn lines(&self, station: &str) -> Result<Arc<Vec<LineId>>, ScheduleError> {
        let source = self.source.read().await;
        self.lines
            .try_get_with(station.to_string(), async {
                source.lines(station).map(Arc::new)
            })
            .await
            .map_err(unshare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::at;
    use crate::testing;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn line(s: &str) -> LineId {
        LineId::parse(s).unwrap()
    }

    /// Wraps a source, counting departure loads and optionally failing.
    struct CountingSource<S> {
        inner: S,
        loads: Arc<AtomicUsize>,
        delay: StdDuration,
        fail: bool,
    }

    impl<S: ScheduleSource> CountingSource<S> {
        fn new(inner: S) -> (Self, Arc<AtomicUsize>) {
            let loads = Arc::new(AtomicUsize::new(0));
            let source = Self {
                inner,
                loads: Arc::clone(&loads),
                delay: StdDuration::ZERO,
                fail: false,
            };
            (source, loads)
        }
    }

    impl<S: ScheduleSource> ScheduleSource for CountingSource<S> {
        fn name(&self) -> &str {
            "counting"
        }

        fn departures(
            &self,
            station: &str,
            line: &LineId,
            date: NaiveDate,
        ) -> Result<Vec<Departure>, ScheduleError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if self.fail {
                return Err(ScheduleError::unavailable("counting", "disk on fire"));
            }
            self.inner.departures(station, line, date)
        }

        fn trip_runs(
            &self,
            from: &str,
            to: &str,
            line: &LineId,
            date: NaiveDate,
        ) -> Result<Vec<TripRun>, ScheduleError> {
            self.inner.trip_runs(from, to, line, date)
        }

        fn transfer_record(
            &self,
            station: &str,
            from_line: &LineId,
            to_line: &LineId,
        ) -> Result<Option<Duration>, ScheduleError> {
            self.inner.transfer_record(station, from_line, to_line)
        }

        fn travel_samples(
            &self,
            from: &str,
            to: &str,
            line: &LineId,
        ) -> Result<Vec<Duration>, ScheduleError> {
            self.inner.travel_samples(from, to, line)
        }

        fn lines(&self, station: &str) -> Result<Vec<LineId>, ScheduleError> {
            self.inner.lines(station)
        }
    }

    fn date() -> NaiveDate {
        at(0, 0).date()
    }

    #[tokio::test]
    async fn repeated_queries_hit_cache() {
        let (source, loads) = CountingSource::new(testing::abd_timetable());
        let provider = CachedSchedule::new(source, ScheduleCacheConfig::default());

        let first = provider.station_schedules("A", &line("1"), date()).await.unwrap();
        let second = provider.station_schedules("A", &line("1"), date()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(first[0].departure, at(5, 30));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_load_once() {
        let (mut source, loads) = CountingSource::new(testing::abd_timetable());
        source.delay = StdDuration::from_millis(50);
        let provider = Arc::new(CachedSchedule::new(source, ScheduleCacheConfig::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move {
                    provider
                        .station_schedules("B", &line("2"), date())
                        .await
                        .map(|d| d.len())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap() > 0);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn source_failures_propagate_and_are_not_cached() {
        let (mut source, loads) = CountingSource::new(testing::abd_timetable());
        source.fail = true;
        let provider = CachedSchedule::new(source, ScheduleCacheConfig::default());

        for _ in 0..2 {
            let err = provider
                .station_schedules("A", &line("1"), date())
                .await
                .unwrap_err();
            assert!(matches!(err, ScheduleError::Unavailable { .. }));
        }
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transfer_times_use_floor_and_default() {
        let provider =
            CachedSchedule::new(testing::abd_timetable(), ScheduleCacheConfig::default());

        // Recorded 120s at B, raised to the floor
        assert_eq!(
            provider.transfer_time("B", &line("1"), &line("2")).await.unwrap(),
            Duration::seconds(MIN_TRANSFER_SECS)
        );
        // Both lines share the one stop at B, so the record covers either
        // direction
        assert_eq!(
            provider.transfer_time("B", &line("2"), &line("1")).await.unwrap(),
            Duration::seconds(MIN_TRANSFER_SECS)
        );
        // Nothing recorded at R
        let provider =
            CachedSchedule::new(testing::dwell_timetable(), ScheduleCacheConfig::default());
        assert_eq!(
            provider.transfer_time("R", &line("4"), &line("5")).await.unwrap(),
            Duration::seconds(DEFAULT_TRANSFER_SECS)
        );
        assert_eq!(
            provider.transfer_time("R", &line("4"), &line("4")).await.unwrap(),
            Duration::zero()
        );
    }

    #[tokio::test]
    async fn representative_travel_time_is_median() {
        let provider =
            CachedSchedule::new(testing::abd_timetable(), ScheduleCacheConfig::default());
        assert_eq!(
            provider
                .representative_travel_time("A", "B", &line("1"))
                .await
                .unwrap(),
            Some(Duration::minutes(10))
        );
        assert_eq!(
            provider
                .representative_travel_time("B", "A", &line("1"))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            provider.lines("B").await.unwrap().as_slice(),
            &[line("1"), line("2")]
        );
    }

    #[tokio::test]
    async fn reload_swaps_source() {
        let (source, loads) = CountingSource::new(testing::abd_timetable());
        let provider = CachedSchedule::new(source, ScheduleCacheConfig::default());

        let before = provider.station_schedules("A", &line("1"), date()).await.unwrap();
        assert!(!before.is_empty());

        let (empty, _) = CountingSource::new(crate::schedule::Timetable::builder("empty").build());
        provider.reload(empty).await;

        let after = provider.station_schedules("A", &line("1"), date()).await.unwrap();
        assert!(after.is_empty());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_forces_reload() {
        let (source, loads) = CountingSource::new(testing::abd_timetable());
        let provider = CachedSchedule::new(source, ScheduleCacheConfig::default());

        provider.station_schedules("A", &line("1"), date()).await.unwrap();
        provider.clear().await;
        provider.station_schedules("A", &line("1"), date()).await.unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
