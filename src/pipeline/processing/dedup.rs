use std::collections::HashSet;
use tracing::{debug, info};

use crate::types::Listing;

/// Counts of listings removed by [`Deduplicator::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub missing_coordinates: usize,
    pub duplicates: usize,
}

impl DedupOutcome {
    pub fn removed(&self) -> usize {
        self.missing_coordinates + self.duplicates
    }
}

/// Exact-key deduplication on the raw `coordinates` string.
///
/// The first listing for a key wins; input order is preserved.
pub struct Deduplicator;

impl Deduplicator {
    pub fn run(listings: &mut Vec<Listing>) -> DedupOutcome {
        let initial = listings.len();
        info!("Removing null values and duplicates...");

        listings.retain(|listing| listing.coordinate_key().is_some());
        let missing_coordinates = initial - listings.len();

        let mut seen: HashSet<String> = HashSet::with_capacity(listings.len());
        listings.retain(|listing| match listing.coordinate_key() {
            Some(key) if seen.insert(key.to_string()) => true,
            Some(key) => {
                debug!("Dropping duplicate listing at {}", key);
                false
            }
            None => false,
        });

        let outcome = DedupOutcome {
            missing_coordinates,
            duplicates: initial - missing_coordinates - listings.len(),
        };
        info!(
            "Removed {} rows with null or duplicate values ({} missing coordinates, {} duplicates)",
            outcome.removed(),
            outcome.missing_coordinates,
            outcome.duplicates
        );
        outcome
    }
}
