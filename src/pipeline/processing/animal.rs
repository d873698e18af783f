use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::config::Taxonomy;
use crate::types::{AnimalType, Listing};

/// Total mapping from main category to animal tag; unknown codes are `other`
pub struct AnimalClassifier<'a> {
    animal_types: &'a BTreeMap<String, AnimalType>,
}

impl<'a> AnimalClassifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            animal_types: &taxonomy.animal_types,
        }
    }

    pub fn classify(&self, main_category: Option<&str>) -> AnimalType {
        main_category
            .and_then(|code| self.animal_types.get(code))
            .copied()
            .unwrap_or_default()
    }

    /// Tag every listing and return the resulting distribution
    pub fn run(&self, listings: &mut [Listing]) -> HashMap<AnimalType, usize> {
        info!("Getting animal type...");
        let mut counts: HashMap<AnimalType, usize> = HashMap::new();
        for listing in listings.iter_mut() {
            let animal = self.classify(listing.main_category.as_deref());
            listing.animal_type = Some(animal);
            *counts.entry(animal).or_default() += 1;
        }

        let mut sorted: Vec<_> = counts.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (animal, count) in sorted {
            info!("  {}: {}", animal, count);
        }
        counts
    }
}
