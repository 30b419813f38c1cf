//! In-memory cache for search results
//!
//! This module provides a bounded result cache that sits in front of the AI
//! backend. Entries expire after a TTL, the least recently used entry is
//! evicted when the bound is exceeded, and refetched results only replace an
//! entry when prices or offers changed significantly.

mod clock;
mod config;
mod result_cache;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_CHANGE_THRESHOLD, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
pub use result_cache::{has_significant_change, normalize_query, CacheEntry, CacheUpdate, ResultCache};
pub use stats::{CacheStats, CacheStatsSnapshot};
