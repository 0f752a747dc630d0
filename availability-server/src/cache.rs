//! Caching layer for stored timetable lookups.
//!
//! Availability queries hit `query_latest` for the same handful of
//! (facility, month) pairs over and over. A short TTL keeps the cache fresh
//! enough for documents that change at most daily, and writes through this
//! wrapper invalidate the affected entries immediately.

use std::time::Duration;

use moka::sync::Cache as MokaCache;

use crate::domain::{FacilityId, FacilityTimetableDocument, MonthYear};
use crate::store::{CompactionReport, DocumentKey, StoreError, StoredDocument, TimetableStore};

/// Cache key for latest-document lookups.
type LatestKey = (FacilityId, MonthYear);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// Timetable store with cached `query_latest`.
///
/// Only found documents are cached; a miss always reaches the inner store.
pub struct CachedTimetableStore<S> {
    inner: S,
    latest: MokaCache<LatestKey, StoredDocument>,
}

impl<S: TimetableStore> CachedTimetableStore<S> {
    /// Create a new cached store.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let latest = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, latest }
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.latest.entry_count()
    }
}

impl<S: TimetableStore> TimetableStore for CachedTimetableStore<S> {
    fn upsert(
        &self,
        key: &DocumentKey,
        document: FacilityTimetableDocument,
    ) -> Result<StoredDocument, StoreError> {
        let stored = self.inner.upsert(key, document)?;
        self.latest
            .invalidate(&(key.facility.clone(), key.month_year()));
        Ok(stored)
    }

    fn query_latest(
        &self,
        facility: &FacilityId,
        month_year: MonthYear,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let key = (facility.clone(), month_year);

        // Try cache first
        if let Some(cached) = self.latest.get(&key) {
            return Ok(Some(cached));
        }

        let found = self.inner.query_latest(facility, month_year)?;
        if let Some(doc) = &found {
            self.latest.insert(key, doc.clone());
        }
        Ok(found)
    }

    fn compact(&self, month_year: MonthYear) -> Result<CompactionReport, StoreError> {
        let report = self.inner.compact(month_year)?;
        self.latest.invalidate_all();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::MemoryTimetableStore;
    use crate::store::fixtures::*;

    /// A cache over a store the test can also write to directly.
    fn shared() -> (
        Arc<MemoryTimetableStore>,
        CachedTimetableStore<Arc<MemoryTimetableStore>>,
    ) {
        let backing = Arc::new(MemoryTimetableStore::default());
        let cached = CachedTimetableStore::new(backing.clone(), &CacheConfig::default());
        (backing, cached)
    }

    fn july() -> MonthYear {
        MonthYear::new(7, 2025).unwrap()
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 1000);
    }

    #[test]
    fn hit_is_served_from_cache() {
        let (backing, store) = shared();
        let f = facility("1234");
        store
            .upsert(&DocumentKey::new(f.clone(), date(2025, 7, 1)), document("1234", "A"))
            .unwrap();

        let first = store.query_latest(&f, july()).unwrap().unwrap();
        store.latest.run_pending_tasks();
        assert_eq!(store.cache_entry_count(), 1);

        // bypass the wrapper: the cached copy is still returned
        backing
            .upsert(&DocumentKey::new(f.clone(), date(2025, 7, 2)), document("1234", "X"))
            .unwrap();
        let second = store.query_latest(&f, july()).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn upsert_invalidates() {
        let store = CachedTimetableStore::new(MemoryTimetableStore::default(), &CacheConfig::default());
        let f = facility("1234");
        store
            .upsert(&DocumentKey::new(f.clone(), date(2025, 7, 1)), document("1234", "A"))
            .unwrap();
        assert_eq!(store.query_latest(&f, july()).unwrap().unwrap().day, 1);

        store
            .upsert(&DocumentKey::new(f.clone(), date(2025, 7, 2)), document("1234", "X"))
            .unwrap();
        let latest = store.query_latest(&f, july()).unwrap().unwrap();
        assert_eq!(latest.day, 2);
        assert_eq!(status_of(&latest), "X");
    }

    #[test]
    fn misses_are_not_cached() {
        let (backing, store) = shared();
        let f = facility("1234");
        assert!(store.query_latest(&f, july()).unwrap().is_none());

        backing
            .upsert(&DocumentKey::new(f.clone(), date(2025, 7, 1)), document("1234", "A"))
            .unwrap();
        assert!(store.query_latest(&f, july()).unwrap().is_some());
    }

    #[test]
    fn compact_passes_through() {
        let (backing, store) = shared();
        for day in [1, 2] {
            store
                .upsert(&DocumentKey::new(facility("1234"), date(2025, 7, day)), document("1234", "A"))
                .unwrap();
        }
        let report = store.compact(july()).unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(backing.len(), 1);
    }
}
