use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{CleanerError, Result};
use crate::types::AnimalType;

/// Category taxonomy and reference-data settings injected into the pipeline.
///
/// Every section falls back to the built-in farm taxonomy when it is left out
/// of a TOML file, so a file only needs the parts it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    /// Scraped label -> canonical category code (case-sensitive)
    pub translations: BTreeMap<String, String>,
    pub whitelists: Whitelists,
    /// Canonical code -> animal tag; unlisted codes classify as `other`
    pub animal_types: BTreeMap<String, AnimalType>,
    pub boundary_properties: BoundaryProperties,
    pub queries: QueryTerms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Whitelists {
    /// Main categories that may describe a farm at all
    pub broad: BTreeSet<String>,
    /// Farm-type keywords a listing must carry in its categories
    pub strict: BTreeSet<String>,
    /// Codes precise enough to become the main category
    pub promotion: BTreeSet<String>,
}

/// Property keys naming the admin levels in the boundary layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryProperties {
    pub country: String,
    pub state: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryTerms {
    pub farm_types: Vec<String>,
}

fn string_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Whitelists {
    fn default() -> Self {
        Self {
            broad: string_set(&[
                "farm",
                "dairy_farm",
                "poultry_farm",
                "organic_farm",
                "cattle_breeder",
                "cattle_farm",
                "livestock_farm",
                "pig_farm",
                "fish_farm",
                "aquaculture_farm",
                "egg_farmer",
                "shrimp_farm",
                "farmer",
                "dairy",
                "livestock_breeder",
                "meat_producer",
            ]),
            strict: string_set(&[
                "dairy_farm",
                "poultry_farm",
                "cattle_breeder",
                "cattle_farm",
                "livestock_farm",
                "pig_farm",
                "fish_farm",
                "aquaculture_farm",
                "egg_farmer",
                "shrimp_farm",
                "dairy",
                "livestock_breeder",
                "meat_producer",
            ]),
            promotion: string_set(&[
                "dairy_farm",
                "poultry_farm",
                "cattle_breeder",
                "cattle_farm",
                "pig_farm",
                "fish_farm",
                "aquaculture_farm",
                "egg_farmer",
                "shrimp_farm",
                "dairy",
            ]),
        }
    }
}

impl Default for BoundaryProperties {
    fn default() -> Self {
        // GADM level-2 attribute names
        Self {
            country: "NAME_0".to_string(),
            state: "NAME_1".to_string(),
            department: "NAME_2".to_string(),
        }
    }
}

impl Default for QueryTerms {
    fn default() -> Self {
        Self {
            farm_types: [
                "dairy farms",
                "poultry farms",
                "cattle farms",
                "livestock farms",
                "pig farms",
                "fish farms",
                "aquaculture farms",
                "egg farmers",
                "chicken hatchery",
                "shrimp farms",
                "seafood farms",
                "beef farms",
                "meat producer",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        let translations = [
            ("Farm", "farm"),
            ("Dairy farm", "dairy_farm"),
            ("Poultry farm", "poultry_farm"),
            ("Organic farm", "organic_farm"),
            ("Cattle breeder", "cattle_breeder"),
            ("Cattle farm", "cattle_farm"),
            ("Livestock farm", "livestock_farm"),
            ("Pig farm", "pig_farm"),
            ("Fish farm", "fish_farm"),
            ("Aquaculture farm", "aquaculture_farm"),
            ("Chicken hatchery", "poultry_farm"),
            ("Egg farmer", "egg_farmer"),
            ("Shrimp farm", "shrimp_farm"),
            ("Seafood farm", "aquaculture_farm"),
            ("Farmer", "farmer"),
            ("Dairy", "dairy_farm"),
            ("Livestock breeder", "livestock_breeder"),
            ("Livestock", "livestock_breeder"),
            ("Livestock producer", "livestock_breeder"),
            ("Meat Producer", "meat_producer"),
        ]
        .iter()
        .map(|(label, code)| (label.to_string(), code.to_string()))
        .collect();

        let animal_types = [
            ("dairy_farm", AnimalType::Cows),
            ("poultry_farm", AnimalType::Poultry),
            ("cattle_breeder", AnimalType::Cows),
            ("cattle_farm", AnimalType::Cows),
            ("livestock_farm", AnimalType::Other),
            ("pig_farm", AnimalType::Pigs),
            ("fish_farm", AnimalType::Fish),
            ("aquaculture_farm", AnimalType::Fish),
            ("egg_farmer", AnimalType::Poultry),
            ("shrimp_farm", AnimalType::Fish),
            ("dairy", AnimalType::Cows),
            ("livestock_breeder", AnimalType::Other),
            ("meat_producer", AnimalType::Other),
        ]
        .iter()
        .map(|(code, animal)| (code.to_string(), *animal))
        .collect();

        Self {
            translations,
            whitelists: Whitelists::default(),
            animal_types,
            boundary_properties: BoundaryProperties::default(),
            queries: QueryTerms::default(),
        }
    }
}

impl Taxonomy {
    /// Load a taxonomy from a TOML file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!(
                "Failed to read taxonomy file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let taxonomy: Taxonomy = toml::from_str(&content)?;
        taxonomy.validate()?;
        info!(
            "Loaded taxonomy from {} ({} translations)",
            path.display(),
            taxonomy.translations.len()
        );
        Ok(taxonomy)
    }

    /// Use the file at `path` when given, the built-in taxonomy otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check that the whitelists nest: promotion within strict within broad
    pub fn validate(&self) -> Result<()> {
        let w = &self.whitelists;

        let outside_strict: Vec<&String> = w.promotion.difference(&w.strict).collect();
        if !outside_strict.is_empty() {
            return Err(CleanerError::Config(format!(
                "promotion whitelist entries missing from strict whitelist: {:?}",
                outside_strict
            )));
        }

        let outside_broad: Vec<&String> = w.strict.difference(&w.broad).collect();
        if !outside_broad.is_empty() {
            return Err(CleanerError::Config(format!(
                "strict whitelist entries missing from broad whitelist: {:?}",
                outside_broad
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_taxonomy_is_consistent() {
        let taxonomy = Taxonomy::default();
        assert!(taxonomy.validate().is_ok());
        assert_eq!(taxonomy.translations.len(), 20);
        assert_eq!(taxonomy.whitelists.broad.len(), 16);
        assert_eq!(taxonomy.whitelists.strict.len(), 13);
        assert_eq!(taxonomy.whitelists.promotion.len(), 10);
        assert_eq!(taxonomy.animal_types.len(), 13);
    }

    #[test]
    fn test_shipped_taxonomy_file_matches_defaults() {
        let shipped: Taxonomy = toml::from_str(include_str!("../taxonomy.toml")).unwrap();
        assert_eq!(shipped, Taxonomy::default());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[translations]
"Goat farm" = "goat_farm"

[boundary_properties]
department = "NAME_3"
"#
        )
        .unwrap();

        let taxonomy = Taxonomy::load(file.path()).unwrap();
        assert_eq!(taxonomy.translations.len(), 1);
        assert_eq!(taxonomy.translations["Goat farm"], "goat_farm");
        assert_eq!(taxonomy.whitelists, Whitelists::default());
        assert_eq!(taxonomy.boundary_properties.country, "NAME_0");
        assert_eq!(taxonomy.boundary_properties.department, "NAME_3");
    }

    #[test]
    fn test_promotion_outside_strict_is_rejected() {
        let mut taxonomy = Taxonomy::default();
        taxonomy.whitelists.promotion.insert("goat_farm".to_string());

        let err = taxonomy.validate().unwrap_err();
        assert!(matches!(err, CleanerError::Config(_)));
        assert!(err.to_string().contains("goat_farm"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Taxonomy::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, CleanerError::Config(_)));
    }
}
