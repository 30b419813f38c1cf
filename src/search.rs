//! Price search service
//!
//! Ties the result cache to a fetcher so callers only deal with queries.

use crate::cache::{CacheStatsSnapshot, ResultCache};
use crate::data::{MedicineResult, ResultFetcher};

/// Cached medicine search over a fetcher
pub struct PriceSearch<F> {
    cache: ResultCache,
    fetcher: F,
}

impl<F: ResultFetcher> PriceSearch<F> {
    /// Creates a search service around an existing cache
    pub fn new(cache: ResultCache, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    /// Searches for `query`, answering from cache when possible
    ///
    /// A blank query returns no results without touching the cache or the
    /// fetcher. Fetch failures are logged by the cache and come back as an
    /// empty list.
    pub async fn search(&self, query: &str, force_refresh: bool) -> Vec<MedicineResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        self.cache
            .get_or_fetch(query, force_refresh, |normalized| async move {
                self.fetcher.fetch(&normalized).await
            })
            .await
    }

    /// The underlying cache
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Cache usage counters
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{offer, FetchError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl ResultFetcher for CountingFetcher {
        async fn fetch(&self, query: &str) -> Result<Vec<MedicineResult>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::EmptyResponse);
            }
            Ok(vec![offer("Farmatodo", query, 1000.0)])
        }
    }

    #[tokio::test]
    async fn test_blank_query_skips_fetcher() {
        let search = PriceSearch::new(ResultCache::with_defaults(), CountingFetcher::new(false));

        assert!(search.search("   ", false).await.is_empty());
        assert_eq!(search.fetcher().calls.load(Ordering::SeqCst), 0);
        assert!(search.cache().is_empty());
    }

    #[tokio::test]
    async fn test_search_uses_cache() {
        let search = PriceSearch::new(ResultCache::with_defaults(), CountingFetcher::new(false));

        let first = search.search("Aspirina", false).await;
        let second = search.search("aspirina ", false).await;

        assert_eq!(first, second);
        assert_eq!(first[0].name, "aspirina");
        assert_eq!(search.fetcher().calls.load(Ordering::SeqCst), 1);
        assert_eq!(search.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_failing_fetcher_yields_empty_results() {
        let search = PriceSearch::new(ResultCache::with_defaults(), CountingFetcher::new(true));

        assert!(search.search("aspirina", false).await.is_empty());
        assert_eq!(search.stats().failed_fetches, 1);
        assert!(search.cache().is_empty());
    }
}
