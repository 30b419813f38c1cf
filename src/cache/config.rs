//! Result cache configuration

use std::time::Duration;

/// Default time-to-live for cached result sets
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Default maximum number of cached queries
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Default relative price change that invalidates an entry
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.05;

/// Configuration for the result cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// How long an entry is served without refetching
    pub ttl: Duration,
    /// Maximum number of entries before the least recently used is evicted
    pub max_entries: usize,
    /// Relative price difference above which a refetch replaces the entry
    pub change_threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
        }
    }
}

impl CacheConfig {
    /// Set the TTL duration
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries (at least one)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Set the relative price change threshold
    pub fn with_change_threshold(mut self, threshold: f64) -> Self {
        self.change_threshold = threshold;
        self
    }
}
