use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::{Taxonomy, Whitelists};
use crate::constants::{CATEGORY_SEPARATOR, MULTIPLE_CATEGORY};
use crate::types::Listing;

/// Whether a normalized listing describes a farm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Listing proceeds to main-category resolution
    Keep,
    /// Main category is not a candidate farm category
    OutsideBroadWhitelist,
    /// No category entry names a specific farm type
    NoFarmKeyword,
}

/// Counts from one filter pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub outside_broad: usize,
    pub no_farm_keyword: usize,
    pub kept: usize,
    /// Kept listings resolved to the ambiguous sentinel
    pub multiple: usize,
}

/// Keeps farm listings and re-derives one authoritative main category.
///
/// After [`CategoryFilter::run`] every listing's `categories` holds only
/// strict-whitelist codes and its `main_category` is either a promotion
/// whitelist code or `"multiple"`.
pub struct CategoryFilter<'a> {
    whitelists: &'a Whitelists,
}

impl<'a> CategoryFilter<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            whitelists: &taxonomy.whitelists,
        }
    }

    pub fn assess(&self, listing: &Listing) -> FilterDecision {
        let broad = listing
            .main_category
            .as_deref()
            .map(|main| self.whitelists.broad.contains(main))
            .unwrap_or(false);
        if !broad {
            return FilterDecision::OutsideBroadWhitelist;
        }

        if !listing
            .categories
            .iter()
            .any(|c| self.whitelists.strict.contains(c))
        {
            return FilterDecision::NoFarmKeyword;
        }

        FilterDecision::Keep
    }

    /// Drop every category entry outside the strict whitelist, keeping order
    pub fn retain_farm_categories(&self, categories: &mut Vec<String>) {
        categories.retain(|c| self.whitelists.strict.contains(c));
    }

    /// A promotable main category stays. Otherwise a single promotable
    /// category entry becomes the main category, and anything else is
    /// ambiguous.
    pub fn resolve_main_category(&self, main_category: Option<&str>, categories: &[String]) -> String {
        let promotion = &self.whitelists.promotion;

        if let Some(main) = main_category.filter(|m| promotion.contains(*m)) {
            return main.to_string();
        }

        match categories {
            [only] if promotion.contains(only) => only.clone(),
            _ => MULTIPLE_CATEGORY.to_string(),
        }
    }

    pub fn run(&self, listings: &mut Vec<Listing>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        info!("Keeping specific categories...");

        listings.retain(|listing| match self.assess(listing) {
            FilterDecision::Keep => true,
            FilterDecision::OutsideBroadWhitelist => {
                debug!("Dropping '{}': main category outside farm whitelist", listing.main_category_str());
                outcome.outside_broad += 1;
                false
            }
            FilterDecision::NoFarmKeyword => {
                debug!("Dropping '{}': no farm keyword in categories", listing.main_category_str());
                outcome.no_farm_keyword += 1;
                false
            }
        });
        info!(
            "Dropped {} listings outside the main category whitelist and {} without farm keywords",
            outcome.outside_broad, outcome.no_farm_keyword
        );

        let mut ambiguous: BTreeMap<String, usize> = BTreeMap::new();
        for listing in listings.iter_mut() {
            self.retain_farm_categories(&mut listing.categories);
            let resolved =
                self.resolve_main_category(listing.main_category.as_deref(), &listing.categories);
            if resolved == MULTIPLE_CATEGORY {
                *ambiguous
                    .entry(listing.categories.join(CATEGORY_SEPARATOR))
                    .or_default() += 1;
            }
            listing.main_category = Some(resolved);
        }

        outcome.kept = listings.len();
        outcome.multiple = ambiguous.values().sum();
        info!(
            "Main categories updated: {} kept, {} marked '{}'",
            outcome.kept, outcome.multiple, MULTIPLE_CATEGORY
        );
        for (categories, count) in &ambiguous {
            info!("  {} [{}]: {}", MULTIPLE_CATEGORY, categories, count);
        }

        outcome
    }
}
