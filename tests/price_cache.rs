//! End-to-end tests for cached price searches
//!
//! Drives `PriceSearch` with a scripted fetcher and a manual clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;

use farmacheck::cache::{CacheConfig, ManualClock, ResultCache};
use farmacheck::data::{FetchError, MedicineResult, ResultFetcher};
use farmacheck::{is_valid_product_url, PriceComparison, PriceSearch};

/// Fetcher that answers from a queue of scripted responses
struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Vec<MedicineResult>, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(responses: Vec<Result<Vec<MedicineResult>, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultFetcher for ScriptedFetcher {
    async fn fetch(&self, _query: &str) -> Result<Vec<MedicineResult>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn result(id: &str, store: &str, price: f64, url: &str) -> MedicineResult {
    MedicineResult {
        id: id.to_string(),
        name: "Ibuprofeno 400mg".to_string(),
        presentation: "Caja x 10 Tab".to_string(),
        price,
        store_name: store.to_string(),
        url: url.to_string(),
        currency: "COP".to_string(),
    }
}

fn ibuprofeno() -> Vec<MedicineResult> {
    vec![
        result("fc-1-0", "Cruz Verde", 8900.0, "https://www.cruzverde.com.co/p/ibuprofeno-400mg"),
        result("fc-1-1", "La Rebaja", 7600.0, "https://www.larebaja.com/search?q=ibuprofeno"),
        result("fc-1-2", "Farmatodo", 8200.0, "https://www.farmatodo.com.co/medicamentos/dolor/ibuprofeno-400"),
    ]
}

fn searcher(
    responses: Vec<Result<Vec<MedicineResult>, FetchError>>,
) -> (PriceSearch<ScriptedFetcher>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = ResultCache::with_clock(CacheConfig::default(), clock.clone());
    (PriceSearch::new(cache, ScriptedFetcher::new(responses)), clock)
}

#[tokio::test]
async fn test_ibuprofeno_scenario() {
    let (search, _clock) = searcher(vec![Ok(ibuprofeno()), Ok(ibuprofeno())]);

    let first = search.search("ibuprofeno", false).await;
    assert_eq!(first.len(), 3);
    assert_eq!(search.fetcher().calls(), 1);

    let second = search.search("ibuprofeno", false).await;
    assert_eq!(second, first);
    assert_eq!(search.fetcher().calls(), 1);

    search.search("ibuprofeno", true).await;
    assert_eq!(search.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_results_are_refetched_after_ttl() {
    let (search, clock) = searcher(vec![Ok(ibuprofeno()), Ok(ibuprofeno())]);

    search.search("Ibuprofeno", false).await;
    clock.advance(Duration::minutes(15));
    search.search("ibuprofeno", false).await;

    assert_eq!(search.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_results() {
    let (search, clock) = searcher(vec![Ok(ibuprofeno()), Err(FetchError::EmptyResponse)]);

    let first = search.search("ibuprofeno", false).await;
    let refreshed = search.search("ibuprofeno", true).await;
    assert!(refreshed.is_empty());

    // Still served from the cache afterwards
    clock.advance(Duration::minutes(1));
    assert_eq!(search.search("ibuprofeno", false).await, first);
    assert_eq!(search.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_price_drop_replaces_cached_results() {
    let mut cheaper = ibuprofeno();
    cheaper[0].price = 7000.0;
    let (search, clock) = searcher(vec![Ok(ibuprofeno()), Ok(cheaper.clone())]);

    search.search("ibuprofeno", false).await;
    clock.advance(Duration::minutes(16));
    search.search("ibuprofeno", false).await;

    let entry = search.cache().peek("ibuprofeno").expect("Entry should exist");
    assert_eq!(entry.results, cheaper);
}

#[tokio::test]
async fn test_only_direct_links_are_offered() {
    let (search, _clock) = searcher(vec![Ok(ibuprofeno())]);

    let comparison = PriceComparison::new(search.search("ibuprofeno", false).await);
    let buyable: Vec<&str> = comparison
        .results()
        .iter()
        .filter(|r| is_valid_product_url(&r.url))
        .map(|r| r.store_name.as_str())
        .collect();

    assert_eq!(comparison.cheapest().unwrap().store_name, "La Rebaja");
    assert_eq!(buyable, vec!["Farmatodo", "Cruz Verde"]);
}
