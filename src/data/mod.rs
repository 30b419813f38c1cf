//! Core data models for FarmaCheck
//!
//! This module contains the priced offer type returned by the AI backend and
//! the price comparison used to present a result set.

pub mod gemini;

pub use gemini::{FetchError, GeminiClient, ResultFetcher};

use serde::{Deserialize, Serialize};

/// Currency code for every offer the backend returns (Colombian pesos)
pub const DEFAULT_CURRENCY: &str = "COP";

/// One priced offer for a medicine at a specific store
///
/// Field names serialize in camelCase to match the JSON the backend produces
/// and the results persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineResult {
    /// Identifier unique within a single fetch
    pub id: String,
    /// Display name, brand or generic plus concentration
    pub name: String,
    /// Packaging, e.g. "Caja x 30 Tab"
    pub presentation: String,
    /// Price in `currency` units, never negative
    pub price: f64,
    /// Store or vendor name
    pub store_name: String,
    /// Candidate product URL, not guaranteed to be well-formed
    pub url: String,
    /// Currency code
    pub currency: String,
}

/// A result set ordered from cheapest to most expensive
#[derive(Debug, Clone, Default)]
pub struct PriceComparison {
    results: Vec<MedicineResult>,
}

impl PriceComparison {
    /// Creates a comparison, sorting the results ascending by price
    ///
    /// The sort is stable, so offers with equal prices keep the order the
    /// backend returned them in.
    pub fn new(mut results: Vec<MedicineResult>) -> Self {
        results.sort_by(|a, b| a.price.total_cmp(&b.price));
        Self { results }
    }

    /// Returns the sorted results
    pub fn results(&self) -> &[MedicineResult] {
        &self.results
    }

    /// Returns true if there are no offers to compare
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the cheapest offer
    pub fn cheapest(&self) -> Option<&MedicineResult> {
        self.results.first()
    }

    /// Returns the most expensive offer
    pub fn most_expensive(&self) -> Option<&MedicineResult> {
        self.results.last()
    }

    /// Returns true if the offer is priced at the minimum of the set
    pub fn is_cheapest(&self, result: &MedicineResult) -> bool {
        self.cheapest().is_some_and(|min| result.price <= min.price)
    }

    /// Difference between the most expensive and the cheapest offer
    pub fn savings(&self) -> f64 {
        match (self.cheapest(), self.most_expensive()) {
            (Some(min), Some(max)) => max.price - min.price,
            _ => 0.0,
        }
    }
}

impl From<Vec<MedicineResult>> for PriceComparison {
    fn from(results: Vec<MedicineResult>) -> Self {
        Self::new(results)
    }
}

#[cfg(test)]
pub(crate) fn offer(store: &str, name: &str, price: f64) -> MedicineResult {
    MedicineResult {
        id: format!("test-{}-{}", store, price),
        name: name.to_string(),
        presentation: "Caja x 30 Tab".to_string(),
        price,
        store_name: store.to_string(),
        url: format!(
            "https://{}.com/p/{}",
            store.to_lowercase().replace(' ', ""),
            name.to_lowercase().replace(' ', "-")
        ),
        currency: DEFAULT_CURRENCY.to_string(),
    }
}
