use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse animal tag derived from a listing's main category
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AnimalType {
    Cows,
    Poultry,
    Pigs,
    Fish,
    #[default]
    Other,
}

impl AnimalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalType::Cows => "cows",
            AnimalType::Poultry => "poultry",
            AnimalType::Pigs => "pigs",
            AnimalType::Fish => "fish",
            AnimalType::Other => "other",
        }
    }
}

impl fmt::Display for AnimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Administrative names attached by the region join (levels 0/1/2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionNames {
    pub country: String,
    pub state: String,
    pub department: String,
}

/// One scraped business listing as it moves through the cleaning stages.
///
/// Scraped attributes are `None` when the source cell was empty. Derived
/// attributes stay `None` until the stage that owns them has run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub name: Option<String>,
    pub website: Option<String>,
    pub main_category: Option<String>,
    /// Raw `categories` cell, consumed by the category normalizer
    pub raw_categories: Option<String>,
    pub categories: Vec<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// `"lat,lon"`; also the deduplication key
    pub coordinates: Option<String>,
    pub link: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub animal_type: Option<AnimalType>,
    /// x = longitude, y = latitude (EPSG:4326)
    pub geometry: Option<Point<f64>>,
    pub region: Option<RegionNames>,
}

impl Listing {
    /// Raw coordinates string, unless missing or blank
    pub fn coordinate_key(&self) -> Option<&str> {
        self.coordinates
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn main_category_str(&self) -> &str {
        self.main_category.as_deref().unwrap_or("")
    }
}
