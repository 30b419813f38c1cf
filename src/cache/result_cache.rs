//! TTL + LRU result cache with content-aware invalidation
//!
//! Maps a normalized query to the last accepted result set. Fresh entries are
//! served without calling the fetcher. Refetched results only replace an entry
//! when the market moved: a new offer appeared or a known offer changed price
//! by more than the configured threshold. Expiry is checked lazily on read;
//! nothing sweeps the map in the background.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::stats::{CacheStats, CacheStatsSnapshot};
use crate::data::MedicineResult;

/// Normalizes user input into a cache key: trimmed and lower-cased
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Cached result set for one normalized query
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Last accepted results, never empty
    pub results: Vec<MedicineResult>,
    /// When the results were last accepted into the cache
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    fn new(results: Vec<MedicineResult>, timestamp: DateTime<Utc>) -> Self {
        Self { results, timestamp }
    }

    /// Whether the entry can still be served at `now`
    ///
    /// A timestamp in the future (clock stepped backwards) counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: std::time::Duration) -> bool {
        match now.signed_duration_since(self.timestamp).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

/// What `update_with_validation` did with a result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheUpdate {
    /// No entry existed; one was created
    Inserted { evicted: Option<String> },
    /// The market changed; results and timestamp were replaced
    Replaced { evicted: Option<String> },
    /// Nothing significant changed; the entry only moved to most recently used
    Touched { evicted: Option<String> },
    /// The result set was empty; the cache was not modified
    Skipped,
}

impl CacheUpdate {
    /// Key evicted to keep the cache within its bound, if any
    pub fn evicted(&self) -> Option<&str> {
        match self {
            CacheUpdate::Inserted { evicted }
            | CacheUpdate::Replaced { evicted }
            | CacheUpdate::Touched { evicted } => evicted.as_deref(),
            CacheUpdate::Skipped => None,
        }
    }
}

/// Returns true if `new` differs meaningfully from `old`
///
/// Offers are matched on equal store name and product name. A new offer with
/// no match, a matched offer whose old price was zero, or a relative price
/// difference above `threshold` all count as significant.
pub fn has_significant_change(
    old: &[MedicineResult],
    new: &[MedicineResult],
    threshold: f64,
) -> bool {
    new.iter().any(|fresh| {
        let Some(previous) = old
            .iter()
            .find(|o| o.store_name == fresh.store_name && o.name == fresh.name)
        else {
            return true;
        };

        if previous.price <= 0.0 {
            return true;
        }

        (fresh.price - previous.price).abs() / previous.price > threshold
    })
}

/// Bounded, time-expiring cache of search results
///
/// One mutex guards the map. It is never held across the fetcher's await, so
/// concurrent callers missing on the same key each fetch independently.
pub struct ResultCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl ResultCache {
    /// Create a cache reading the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache reading the given clock
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let config = CacheConfig {
            max_entries: config.max_entries.max(1),
            ..config
        };
        Self {
            entries: Mutex::new(LruCache::unbounded()),
            config,
            clock,
            stats: CacheStats::new(),
        }
    }

    /// Create a cache with default configuration
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Returns cached results for `query`, fetching them when needed
    ///
    /// Unless `force_refresh` is set, a fresh entry is returned as-is and
    /// `fetch` is not called. Otherwise `fetch` is called exactly once with the
    /// normalized query. An error or an empty answer yields an empty list and
    /// leaves the cache untouched; a non-empty answer goes through
    /// [`ResultCache::update_with_validation`] and is returned.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        query: &str,
        force_refresh: bool,
        fetch: F,
    ) -> Vec<MedicineResult>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<MedicineResult>, E>>,
        E: std::fmt::Display,
    {
        let key = normalize_query(query);

        if !force_refresh {
            if let Some(results) = self.fresh_results(&key) {
                self.stats.record_hit();
                debug!(query = %key, count = results.len(), "Cache hit");
                return results;
            }
        }

        if !force_refresh {
            self.stats.record_miss();
        }
        self.stats.record_fetch();
        debug!(query = %key, force_refresh, "Fetching results");

        match fetch(key.clone()).await {
            Err(err) => {
                self.stats.record_failed_fetch();
                warn!(query = %key, error = %err, "Fetch failed, cache left unchanged");
                Vec::new()
            }
            Ok(results) if results.is_empty() => {
                self.stats.record_empty_fetch();
                debug!(query = %key, "Fetch returned no results, cache left unchanged");
                results
            }
            Ok(results) => {
                self.update_with_validation(&key, results.clone());
                results
            }
        }
    }

    /// Stores a non-empty result set, replacing the entry only on significant change
    ///
    /// The entry for `key` always ends up most recently used. If the cache then
    /// holds more than `max_entries`, the least recently used entry is evicted.
    /// An empty result set is ignored and leaves entries and their order as is.
    pub fn update_with_validation(&self, key: &str, results: Vec<MedicineResult>) -> CacheUpdate {
        let key = normalize_query(key);
        if results.is_empty() {
            debug!(query = %key, "Ignoring empty result set");
            return CacheUpdate::Skipped;
        }

        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let changed = entries.peek(&key).map(|existing| {
            has_significant_change(&existing.results, &results, self.config.change_threshold)
        });

        match changed {
            None | Some(true) => {
                entries.put(key.clone(), CacheEntry::new(results, now));
                self.stats.record_refresh();
            }
            Some(false) => {
                entries.promote(&key);
                self.stats.record_touch();
            }
        }

        let evicted = if entries.len() > self.config.max_entries {
            entries.pop_lru().map(|(oldest, _)| oldest)
        } else {
            None
        };
        drop(entries);

        if changed == Some(true) {
            debug!(query = %key, "Cache entry replaced after market change");
        }
        if let Some(oldest) = &evicted {
            self.stats.record_eviction();
            debug!(query = %oldest, "Evicted least recently used entry");
        }

        match changed {
            None => CacheUpdate::Inserted { evicted },
            Some(true) => CacheUpdate::Replaced { evicted },
            Some(false) => CacheUpdate::Touched { evicted },
        }
    }

    /// Clone of the results for `key` if its entry is still fresh
    fn fresh_results(&self, key: &str) -> Option<Vec<MedicineResult>> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        entries
            .peek(key)
            .filter(|entry| entry.is_fresh(now, self.config.ttl))
            .map(|entry| entry.results.clone())
    }

    /// Copy of the entry for `query` without affecting recency
    pub fn peek(&self, query: &str) -> Option<CacheEntry> {
        self.entries.lock().peek(&normalize_query(query)).cloned()
    }

    /// Whether an entry exists for `query`, fresh or not
    pub fn contains(&self, query: &str) -> bool {
        self.entries.lock().contains(&normalize_query(query))
    }

    /// Cached keys from least to most recently used
    pub fn keys_lru_order(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of cached queries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry and reset the usage counters
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.stats.reset();
    }

    /// Active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current usage counters
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
