//! Freshness-checked catalog cache.

use std::sync::Arc;
use std::time::Duration;

use card_ledger_core::CardDefinition;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{CatalogError, CatalogSource, Clock, SnapshotStore};

/// Storage key of the persisted snapshot.
pub const CATALOG_CACHE_KEY: &str = "catalog-cache";

/// Default freshness window.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// The catalog as of one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCatalogSnapshot {
    pub cards: Vec<CardDefinition>,
    pub fetched_at_epoch_ms: i64,
}

impl CachedCatalogSnapshot {
    /// A snapshot is fresh while `0 <= now - fetched_at < max_age`.
    ///
    /// Snapshots stamped in the future are not trusted.
    #[must_use]
    pub fn is_fresh(&self, now_epoch_ms: i64, max_age: Duration) -> bool {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let age_ms = now_epoch_ms.saturating_sub(self.fetched_at_epoch_ms);
        (0..max_age_ms).contains(&age_ms)
    }
}

/// Process-wide catalog cache.
///
/// Cheaply cloneable via `Arc`. Reads check an in-memory layer first, then the
/// persisted snapshot, and only then go to the network.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Arc<CatalogCacheInner>,
}

struct CatalogCacheInner {
    source: Arc<dyn CatalogSource>,
    snapshots: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    memory: Cache<&'static str, Arc<CachedCatalogSnapshot>>,
}

impl CatalogCache {
    /// Create a cache.
    #[must_use]
    pub fn new(
        source: Arc<dyn CatalogSource>,
        snapshots: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        max_age: Duration,
    ) -> Self {
        // Single entry; freshness is decided against the injected clock, not by moka
        let memory = Cache::builder().max_capacity(1).build();

        Self {
            inner: Arc::new(CatalogCacheInner {
                source,
                snapshots,
                clock,
                max_age,
                memory,
            }),
        }
    }

    /// Freshness window of this cache.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.inner.max_age
    }

    /// Get the catalog, refetching if no fresh snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if a refetch was needed and failed.
    #[instrument(skip(self))]
    pub async fn get_catalog(&self) -> Result<Arc<CachedCatalogSnapshot>, CatalogError> {
        let now = self.inner.clock.now_epoch_ms();

        if let Some(snapshot) = self.inner.memory.get(CATALOG_CACHE_KEY).await
            && snapshot.is_fresh(now, self.inner.max_age)
        {
            debug!("Catalog memory hit");
            return Ok(snapshot);
        }

        match self.inner.snapshots.load().await {
            Ok(Some(snapshot)) if snapshot.is_fresh(now, self.inner.max_age) => {
                debug!(
                    fetched_at_epoch_ms = snapshot.fetched_at_epoch_ms,
                    "Catalog snapshot hit"
                );
                let snapshot = Arc::new(snapshot);
                self.inner
                    .memory
                    .insert(CATALOG_CACHE_KEY, Arc::clone(&snapshot))
                    .await;
                return Ok(snapshot);
            }
            Ok(Some(snapshot)) => {
                debug!(
                    fetched_at_epoch_ms = snapshot.fetched_at_epoch_ms,
                    "Catalog snapshot is stale"
                );
            }
            Ok(None) => debug!("No catalog snapshot stored"),
            Err(e) => warn!(error = %e, "Ignoring unreadable catalog snapshot"),
        }

        self.refresh().await
    }

    /// Fetch the catalog unconditionally and replace the snapshot.
    ///
    /// A failure to persist the new snapshot is logged but does not fail the
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<CachedCatalogSnapshot>, CatalogError> {
        let cards = self.inner.source.fetch().await.inspect_err(|e| {
            warn!(error = %e, "Catalog fetch failed");
        })?;

        let snapshot = Arc::new(CachedCatalogSnapshot {
            cards,
            fetched_at_epoch_ms: self.inner.clock.now_epoch_ms(),
        });

        if let Err(e) = self.inner.snapshots.save(&snapshot).await {
            warn!(error = %e, "Failed to persist catalog snapshot");
        }
        self.inner
            .memory
            .insert(CATALOG_CACHE_KEY, Arc::clone(&snapshot))
            .await;

        info!(cards = snapshot.cards.len(), "Catalog refreshed");
        Ok(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use card_ledger_core::{CardId, UnitPrice};

    use super::*;
    use crate::catalog::{ManualClock, MemorySnapshotStore, StaticCatalogSource};

    const HOUR: Duration = Duration::from_secs(3600);
    const NOW: i64 = 1_760_000_000_000;

    fn hours_ms(hours: i64) -> i64 {
        hours * 3_600_000
    }

    fn cards() -> Vec<CardDefinition> {
        vec![CardDefinition::new(
            CardId::parse("OP01-001").unwrap(),
            None,
            Some("Luffy".to_owned()),
            UnitPrice::Unknown,
        )]
    }

    fn build(
        source: &StaticCatalogSource,
        snapshots: MemorySnapshotStore,
        clock: &Arc<ManualClock>,
    ) -> (CatalogCache, Arc<MemorySnapshotStore>) {
        let snapshots = Arc::new(snapshots);
        let cache = CatalogCache::new(
            Arc::new(source.clone()),
            Arc::clone(&snapshots) as Arc<dyn SnapshotStore>,
            Arc::clone(clock) as Arc<dyn Clock>,
            DEFAULT_MAX_AGE,
        );
        (cache, snapshots)
    }

    fn stored(age_hours: i64) -> MemorySnapshotStore {
        MemorySnapshotStore::with_snapshot(CachedCatalogSnapshot {
            cards: Vec::new(),
            fetched_at_epoch_ms: NOW - hours_ms(age_hours),
        })
    }

    #[test]
    fn test_is_fresh_window() {
        let snapshot = CachedCatalogSnapshot {
            cards: Vec::new(),
            fetched_at_epoch_ms: NOW,
        };
        assert!(snapshot.is_fresh(NOW, DEFAULT_MAX_AGE));
        assert!(snapshot.is_fresh(NOW + hours_ms(23), DEFAULT_MAX_AGE));
        assert!(!snapshot.is_fresh(NOW + hours_ms(24), DEFAULT_MAX_AGE));
        assert!(!snapshot.is_fresh(NOW - 1, DEFAULT_MAX_AGE));
    }

    #[tokio::test]
    async fn test_snapshot_23_hours_old_is_served_without_fetch() {
        let source = StaticCatalogSource::new(cards());
        let clock = Arc::new(ManualClock::new(NOW));
        let (cache, _) = build(&source, stored(23), &clock);

        let snapshot = cache.get_catalog().await.unwrap();
        assert!(snapshot.cards.is_empty());
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_25_hours_old_is_refetched() {
        let source = StaticCatalogSource::new(cards());
        let clock = Arc::new(ManualClock::new(NOW));
        let (cache, snapshots) = build(&source, stored(25), &clock);

        let snapshot = cache.get_catalog().await.unwrap();
        assert_eq!(snapshot.cards, cards());
        assert_eq!(source.fetch_count(), 1);

        let persisted = snapshots.load().await.unwrap().unwrap();
        assert_eq!(persisted.fetched_at_epoch_ms, NOW);
        assert_eq!(persisted.cards, cards());
    }

    #[tokio::test]
    async fn test_first_read_fetches_then_memoizes() {
        let source = StaticCatalogSource::new(cards());
        let clock = Arc::new(ManualClock::new(NOW));
        let (cache, _) = build(&source, MemorySnapshotStore::new(), &clock);

        cache.get_catalog().await.unwrap();
        clock.advance(23 * HOUR);
        cache.get_catalog().await.unwrap();
        assert_eq!(source.fetch_count(), 1);

        clock.advance(2 * HOUR);
        cache.get_catalog().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_not_a_fallback() {
        let source = StaticCatalogSource::new(cards());
        source.set_failing(true);
        let clock = Arc::new(ManualClock::new(NOW));
        let (cache, _) = build(&source, stored(25), &clock);

        assert!(matches!(
            cache.get_catalog().await,
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_with_no_snapshot() {
        let source = StaticCatalogSource::new(cards());
        source.set_failing(true);
        let clock = Arc::new(ManualClock::new(NOW));
        let (cache, _) = build(&source, MemorySnapshotStore::new(), &clock);

        assert!(cache.get_catalog().await.is_err());

        source.set_failing(false);
        assert_eq!(cache.get_catalog().await.unwrap().cards, cards());
    }

    #[tokio::test]
    async fn test_refresh_always_fetches() {
        let source = StaticCatalogSource::new(cards());
        let clock = Arc::new(ManualClock::new(NOW));
        let (cache, _) = build(&source, stored(1), &clock);

        cache.refresh().await.unwrap();
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.get_catalog().await.unwrap().cards, cards());
        assert_eq!(source.fetch_count(), 1);
    }
}
