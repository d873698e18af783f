use std::collections::BTreeMap;
use tracing::info;

use crate::config::Taxonomy;
use crate::constants::CATEGORY_SEPARATOR;
use crate::types::Listing;

/// Maps scraped category labels to canonical category codes.
///
/// Lookups are literal and case-sensitive. Labels without an entry pass
/// through unchanged, so already-canonical codes are fixed points and running
/// the normalizer twice gives the same listing as running it once.
pub struct CategoryNormalizer<'a> {
    translations: &'a BTreeMap<String, String>,
}

impl<'a> CategoryNormalizer<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            translations: &taxonomy.translations,
        }
    }

    /// Canonical code for `label`, or `label` itself when unmapped
    pub fn translate<'l>(&'l self, label: &'l str) -> &'l str {
        self.translations
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }

    /// Split a raw `categories` cell into labels; empty input yields none
    pub fn split_categories(raw: Option<&str>) -> Vec<String> {
        match raw {
            Some(raw) if !raw.is_empty() => {
                raw.split(CATEGORY_SEPARATOR).map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn normalize_main_category(&self, listing: &mut Listing) {
        let translations = self.translations;
        if let Some(code) = listing
            .main_category
            .as_deref()
            .and_then(|main| translations.get(main))
        {
            listing.main_category = Some(code.clone());
        }
    }

    /// Consume the raw cell (if still present) and translate every entry
    pub fn normalize_categories(&self, listing: &mut Listing) {
        if let Some(raw) = listing.raw_categories.take() {
            listing.categories = Self::split_categories(Some(&raw));
        }
        for category in listing.categories.iter_mut() {
            if let Some(code) = self.translations.get(category.as_str()) {
                *category = code.clone();
            }
        }
    }

    pub fn normalize(&self, listing: &mut Listing) {
        self.normalize_main_category(listing);
        self.normalize_categories(listing);
    }

    pub fn run(&self, listings: &mut [Listing]) {
        info!("Formatting main categories and categories...");
        for listing in listings.iter_mut() {
            self.normalize(listing);
        }
        info!("Categories formatted for {} listings", listings.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(main: Option<&str>, categories: Option<&str>) -> Listing {
        Listing {
            main_category: main.map(str::to_string),
            raw_categories: categories.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_known_labels_are_translated() {
        let taxonomy = Taxonomy::default();
        let normalizer = CategoryNormalizer::new(&taxonomy);

        let mut listing = raw(Some("Chicken hatchery"), Some("Dairy, Pig farm, Seafood farm"));
        normalizer.normalize(&mut listing);

        assert_eq!(listing.main_category.as_deref(), Some("poultry_farm"));
        assert_eq!(
            listing.categories,
            vec!["dairy_farm", "pig_farm", "aquaculture_farm"]
        );
        assert_eq!(listing.raw_categories, None);
        assert_eq!(normalizer.translate("Farmer"), "farmer");
        assert_eq!(normalizer.translate("farmer"), "farmer");
    }

    #[test]
    fn test_unknown_labels_pass_through() {
        let taxonomy = Taxonomy::default();
        let normalizer = CategoryNormalizer::new(&taxonomy);

        let mut listing = raw(Some("Garden center"), Some("Garden center, dairy farm"));
        normalizer.normalize(&mut listing);

        assert_eq!(listing.main_category.as_deref(), Some("Garden center"));
        // Lookup is case-sensitive
        assert_eq!(listing.categories, vec!["Garden center", "dairy farm"]);
    }

    #[test]
    fn test_absent_categories_become_empty_sequence() {
        let taxonomy = Taxonomy::default();
        let normalizer = CategoryNormalizer::new(&taxonomy);

        let mut absent = raw(Some("Farm"), None);
        let mut empty = raw(None, Some(""));
        normalizer.normalize(&mut absent);
        normalizer.normalize(&mut empty);

        assert!(absent.categories.is_empty());
        assert!(empty.categories.is_empty());
        assert_eq!(empty.main_category, None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let taxonomy = Taxonomy::default();
        let normalizer = CategoryNormalizer::new(&taxonomy);

        let mut once = raw(Some("Livestock"), Some("Dairy, Pig farm, Orchard"));
        normalizer.normalize(&mut once);
        let mut twice = once.clone();
        normalizer.normalize(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_alternate_taxonomy_is_used() {
        let mut taxonomy = Taxonomy::default();
        taxonomy.translations.clear();
        taxonomy
            .translations
            .insert("Bauernhof".to_string(), "farm".to_string());
        let normalizer = CategoryNormalizer::new(&taxonomy);

        let mut listing = raw(Some("Bauernhof"), Some("Dairy farm"));
        normalizer.normalize(&mut listing);

        assert_eq!(listing.main_category.as_deref(), Some("farm"));
        assert_eq!(listing.categories, vec!["Dairy farm"]);
    }
}
