//! FarmaCheck Library
//!
//! Medicine price comparison for Colombian pharmacies: a TTL + LRU result
//! cache in front of an AI-backed price search, and a deep-link validator that
//! decides which product URLs are offered as purchase links.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod links;
pub mod output;
pub mod search;
pub mod session;

pub use cache::{normalize_query, CacheConfig, ResultCache};
pub use data::{MedicineResult, PriceComparison};
pub use links::{classify_product_url, is_valid_product_url, LinkVerdict};
pub use search::PriceSearch;
