//! Resolves everything a screen reads into one `SnapshotSet`.
//!
//! Entities are fetched fresh on every pass, concurrently. History series
//! are the one exception: they are reused for [`HISTORY_CACHE_TTL`] across
//! every screen of the device. An expired series stays around only while a
//! screen still requests it, as a fallback for failed fetches.

use chrono::{DateTime, FixedOffset};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tinydash_core::constants::HISTORY_CACHE_TTL;
use tinydash_core::{Dependencies, SharedResolver};
use tinydash_types::{HistoryPoint, SnapshotSet};
use tokio::time::Instant;

struct CachedHistory {
    fetched_at: Instant,
    points: Vec<HistoryPoint>,
}

type HistoryKey = (String, u32);

#[derive(Clone)]
pub struct SnapshotFetcher {
    resolver: SharedResolver,
    ttl: Duration,
    history_cache: Arc<Mutex<HashMap<HistoryKey, CachedHistory>>>,
}

impl SnapshotFetcher {
    pub fn new(resolver: SharedResolver) -> Self {
        Self::with_ttl(resolver, HISTORY_CACHE_TTL)
    }

    pub fn with_ttl(resolver: SharedResolver, ttl: Duration) -> Self {
        Self {
            resolver,
            ttl,
            history_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<HistoryKey, CachedHistory>> {
        self.history_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop every cached series, e.g. after a configuration reload
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub async fn fetch(
        &self,
        deps: &Dependencies,
        wall_time: DateTime<FixedOffset>,
        now: Instant,
    ) -> SnapshotSet {
        let mut snapshots = SnapshotSet::new(wall_time);

        let states = join_all(deps.entities.iter().map(|id| self.resolver.resolve(id))).await;
        for (id, state) in deps.entities.iter().zip(states) {
            match state {
                Some(state) => snapshots.insert_state(state),
                None => log::debug!("{}: no state for {}", self.resolver.name(), id),
            }
        }

        // Split history requests into fresh cache hits and series to fetch
        let mut stale = Vec::new();
        {
            let cache = self.cache();
            for key in &deps.histories {
                match cache.get(key) {
                    Some(entry) if now.saturating_duration_since(entry.fetched_at) < self.ttl => {
                        snapshots.insert_history(&key.0, key.1, entry.points.clone());
                    }
                    _ => stale.push(key.clone()),
                }
            }
        }

        let fetched = join_all(
            stale
                .iter()
                .map(|(id, hours)| self.resolver.resolve_history(id, *hours)),
        )
        .await;

        let mut cache = self.cache();
        for ((id, hours), points) in stale.into_iter().zip(fetched) {
            match points {
                Some(points) => {
                    snapshots.insert_history(&id, hours, points.clone());
                    cache.insert(
                        (id, hours),
                        CachedHistory {
                            fetched_at: now,
                            points,
                        },
                    );
                }
                None => {
                    // Serve the expired series rather than nothing
                    if let Some(entry) = cache.get(&(id.clone(), hours)) {
                        log::debug!("History for {} unavailable, reusing cached series", id);
                        snapshots.insert_history(&id, hours, entry.points.clone());
                    }
                }
            }
        }
        let ttl = self.ttl;
        cache.retain(|key, entry| {
            deps.histories.contains(key) || now.saturating_duration_since(entry.fetched_at) < ttl
        });

        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tinydash_core::ValueResolver;
    use tinydash_types::EntityState;

    #[derive(Default)]
    struct CountingResolver {
        history_calls: AtomicU32,
        history_down: AtomicBool,
    }

    #[async_trait]
    impl ValueResolver for CountingResolver {
        fn name(&self) -> &str {
            "counting"
        }

        async fn resolve(&self, entity_id: &str) -> Option<EntityState> {
            (entity_id != "sensor.missing").then(|| EntityState::new(entity_id, "1"))
        }

        async fn resolve_history(&self, _entity_id: &str, _hours: u32) -> Option<Vec<HistoryPoint>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.history_down.load(Ordering::SeqCst) {
                return None;
            }
            Some(vec![HistoryPoint::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 1.0)])
        }
    }

    fn wall() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_states_and_cached_history() {
        let resolver = Arc::new(CountingResolver::default());
        let fetcher = SnapshotFetcher::with_ttl(resolver.clone(), Duration::from_secs(300));
        let deps = Dependencies::default()
            .entity("sensor.a")
            .entity("sensor.missing")
            .history("sensor.a", 24);

        let t0 = Instant::now();
        let first = fetcher.fetch(&deps, wall(), t0).await;
        assert!(first.state("sensor.a").is_some());
        assert!(first.state("sensor.missing").is_none());
        assert_eq!(first.history("sensor.a", 24).map(|h| h.len()), Some(1));
        assert_eq!(first.now, wall());

        fetcher.fetch(&deps, wall(), t0 + Duration::from_secs(299)).await;
        assert_eq!(resolver.history_calls.load(Ordering::SeqCst), 1);

        fetcher.fetch(&deps, wall(), t0 + Duration::from_secs(300)).await;
        assert_eq!(resolver.history_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_survives_screen_cycling() {
        let resolver = Arc::new(CountingResolver::default());
        let fetcher = SnapshotFetcher::with_ttl(resolver.clone(), Duration::from_secs(300));
        let chart_screen = Dependencies::default().entity("sensor.a").history("sensor.a", 24);
        let clock_screen = Dependencies::default();
        let t0 = Instant::now();

        fetcher.fetch(&chart_screen, wall(), t0).await;
        fetcher.fetch(&clock_screen, wall(), t0 + Duration::from_secs(10)).await;
        let back = fetcher.fetch(&chart_screen, wall(), t0 + Duration::from_secs(20)).await;
        assert_eq!(resolver.history_calls.load(Ordering::SeqCst), 1);
        assert_eq!(back.history("sensor.a", 24).map(|h| h.len()), Some(1));
    }

    #[tokio::test]
    async fn test_expired_series_fallback_and_eviction() {
        let resolver = Arc::new(CountingResolver::default());
        let fetcher = SnapshotFetcher::with_ttl(resolver.clone(), Duration::from_secs(300));
        let chart_screen = Dependencies::default().history("sensor.a", 24);
        let t0 = Instant::now();
        fetcher.fetch(&chart_screen, wall(), t0).await;
        resolver.history_down.store(true, Ordering::SeqCst);

        // Requested but failing: the expired series is served
        let stale = fetcher.fetch(&chart_screen, wall(), t0 + Duration::from_secs(301)).await;
        assert!(stale.history("sensor.a", 24).is_some());

        // Expired and not requested: dropped
        fetcher.fetch(&Dependencies::default(), wall(), t0 + Duration::from_secs(302)).await;
        let gone = fetcher.fetch(&chart_screen, wall(), t0 + Duration::from_secs(303)).await;
        assert!(gone.history("sensor.a", 24).is_none());
    }
}
