//! Plain-text rendering of search results

use std::fmt;

use crate::cache::CacheStatsSnapshot;
use crate::data::{MedicineResult, PriceComparison};
use crate::links::{classify_product_url, LinkVerdict};

/// Formats a peso amount the way Colombian stores print it, e.g. `$12.500`
pub fn format_cop(price: f64) -> String {
    let rounded = price.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("${}", grouped)
}

/// The purchase link for a result, or the reason it is withheld
pub fn buy_link(result: &MedicineResult) -> Result<&str, LinkVerdict> {
    match classify_product_url(&result.url) {
        LinkVerdict::Valid => Ok(&result.url),
        verdict => Err(verdict),
    }
}

/// Renders a comparison as a table, cheapest first
pub fn render_comparison(comparison: &PriceComparison) -> String {
    ComparisonTable(comparison).to_string()
}

/// Text table for a price comparison
struct ComparisonTable<'a>(&'a PriceComparison);

impl fmt::Display for ComparisonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let comparison = self.0;

        if comparison.is_empty() {
            return writeln!(f, "No offers found. Try another name or refresh later.");
        }

        // A lone offer is not "cheapest" of anything
        let mark_cheapest = comparison.results().len() > 1;

        for result in comparison.results() {
            let marker = if mark_cheapest && comparison.is_cheapest(result) {
                "*"
            } else {
                " "
            };
            writeln!(
                f,
                "{} {:>10}  {:<22} {} ({})",
                marker,
                format_cop(result.price),
                result.store_name,
                result.name,
                result.presentation
            )?;
            match buy_link(result) {
                Ok(url) => writeln!(f, "             buy: {}", url)?,
                Err(verdict) => writeln!(f, "             no direct link ({})", verdict.describe())?,
            }
        }

        if let (Some(min), Some(max)) = (comparison.cheapest(), comparison.most_expensive()) {
            writeln!(
                f,
                "\n{} offers. Cheapest at {}: {}. Save up to {} versus {}.",
                comparison.results().len(),
                min.store_name,
                format_cop(min.price),
                format_cop(comparison.savings()),
                max.store_name
            )?;
        }

        Ok(())
    }
}

/// Renders cache counters on one line
pub fn render_stats(stats: &CacheStatsSnapshot, entries: usize) -> String {
    format!(
        "{} cached queries, {} hits, {} misses ({:.0}% hit rate), {} fetches, {} refreshed, {} unchanged, {} failed, {} evicted",
        entries,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0,
        stats.fetches,
        stats.refreshes,
        stats.touches,
        stats.failed_fetches,
        stats.evictions
    )
}
