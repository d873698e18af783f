use std::collections::BTreeMap;
use tracing::info;

use crate::types::Listing;

/// Listing count per main category; unset categories count under `""`
pub fn main_category_distribution(listings: &[Listing]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for listing in listings {
        *counts.entry(listing.main_category_str().to_string()).or_default() += 1;
    }
    counts
}

/// Listing count per animal tag; untagged listings are not counted
pub fn animal_type_distribution(listings: &[Listing]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for animal in listings.iter().filter_map(|l| l.animal_type) {
        *counts.entry(animal.to_string()).or_default() += 1;
    }
    counts
}

/// Log a checkpoint of the record set after `stage`
pub fn log_snapshot(stage: &str, listings: &[Listing]) {
    let distribution = main_category_distribution(listings);
    info!(
        stage,
        records = listings.len(),
        unique_main_categories = distribution.len(),
        "Checking data"
    );

    let mut by_count: Vec<(&String, &usize)> = distribution.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (category, count) in by_count.into_iter().take(15) {
        info!(stage, "  {}: {}", category, count);
    }
}
