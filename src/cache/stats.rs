//! Cache statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how the result cache has been used
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    hits: AtomicU64,
    /// Unforced lookups with no fresh entry
    misses: AtomicU64,
    /// Calls to the fetcher, forced refreshes included
    fetches: AtomicU64,
    /// Fetches that returned an error
    failed_fetches: AtomicU64,
    /// Fetches that returned no results
    empty_fetches: AtomicU64,
    /// Entries inserted or replaced because their content changed
    refreshes: AtomicU64,
    /// Refetches that matched the cached content and only reordered it
    touches: AtomicU64,
    /// Entries evicted to respect the size bound
    evictions: AtomicU64,
}

/// Point-in-time copy of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub failed_fetches: u64,
    pub empty_fetches: u64,
    pub refreshes: u64,
    pub touches: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_fetch(&self) {
        self.failed_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_fetch(&self) {
        self.empty_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_touch(&self) {
        self.touches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            empty_fetches: self.empty_fetches.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            touches: self.touches.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.fetches,
            &self.failed_fetches,
            &self.empty_fetches,
            &self.refreshes,
            &self.touches,
            &self.evictions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl CacheStatsSnapshot {
    /// Fraction of lookups served from cache, 0.0 when there were none
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
