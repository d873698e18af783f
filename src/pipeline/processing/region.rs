//! Administrative-region assignment by point-in-polygon join.
//!
//! Boundary polygons are indexed in an R-tree by bounding box; candidates
//! from the index are confirmed with an exact containment test. A point on a
//! polygon edge is not contained.
//!
//! When a point falls in several polygons, the region that comes first in
//! the boundary file wins. Every such overlap is logged and counted so it
//! surfaces as a data-quality signal.

use geo::{BoundingRect, Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::BoundaryProperties;
use crate::error::{CleanerError, Result};
use crate::types::{Listing, RegionNames};

/// One level-2 administrative area
#[derive(Debug, Clone)]
pub struct BoundaryRegion {
    pub names: RegionNames,
    pub geometry: MultiPolygon<f64>,
}

/// Bounding box of a region, pointing back to its position in the layer
#[derive(Debug, Clone)]
struct RegionEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

// GeoJSON shapes we accept
#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
    geometry: Option<GeometryObject>,
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeometryObject {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

/// Read-only boundary layer with a spatial index over its polygons
pub struct BoundaryLayer {
    regions: Vec<BoundaryRegion>,
    index: RTree<RegionEnvelope>,
}

/// A containing region for a point
#[derive(Debug, Clone, Copy)]
pub struct RegionMatch<'a> {
    pub region: &'a BoundaryRegion,
    /// Position of the region in the boundary layer
    pub layer_index: usize,
    /// How many other regions also contain the point
    pub overlapping: usize,
}

impl BoundaryLayer {
    pub fn from_regions(regions: Vec<BoundaryRegion>) -> Self {
        let envelopes = regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| {
                let rect = region.geometry.bounding_rect()?;
                Some(RegionEnvelope {
                    index,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            regions,
            index: RTree::bulk_load(envelopes),
        }
    }

    /// Load a GeoJSON FeatureCollection of Polygon/MultiPolygon features
    pub fn load(path: impl AsRef<Path>, properties: &BoundaryProperties) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading boundary layer from {}", path.display());
        let file = File::open(path).map_err(|e| {
            CleanerError::BoundaryLoad(format!("cannot open {}: {}", path.display(), e))
        })?;
        let layer = Self::from_reader(BufReader::new(file), properties)?;
        info!("Loaded {} boundary regions", layer.len());
        Ok(layer)
    }

    pub fn from_reader<R: Read>(reader: R, properties: &BoundaryProperties) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_reader(reader)
            .map_err(|e| CleanerError::BoundaryLoad(format!("invalid GeoJSON: {}", e)))?;

        let regions = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(i, feature)| region_from_feature(i, feature, properties))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_regions(regions))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    /// First region in layer order containing `point`, if any
    pub fn locate(&self, point: &Point<f64>) -> Option<RegionMatch<'_>> {
        let probe = AABB::from_point([point.x(), point.y()]);
        let mut hits: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&probe)
            .map(|candidate| candidate.index)
            .filter(|&i| self.regions[i].geometry.contains(point))
            .collect();
        hits.sort_unstable();

        let first = *hits.first()?;
        Some(RegionMatch {
            region: &self.regions[first],
            layer_index: first,
            overlapping: hits.len() - 1,
        })
    }

    /// Department names grouped by state; states sorted, departments in layer order
    pub fn departments_by_state(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for region in &self.regions {
            grouped
                .entry(region.names.state.as_str())
                .or_default()
                .push(region.names.department.as_str());
        }
        grouped
    }
}

fn region_from_feature(
    i: usize,
    feature: Feature,
    properties: &BoundaryProperties,
) -> Result<BoundaryRegion> {
    let props = feature.properties.unwrap_or_default();
    let name = |key: &str| -> Result<String> {
        match props.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(CleanerError::BoundaryLoad(format!(
                "feature {} has no '{}' property",
                i, key
            ))),
        }
    };

    let names = RegionNames {
        country: name(&properties.country)?,
        state: name(&properties.state)?,
        department: name(&properties.department)?,
    };

    let geometry = match feature.geometry {
        Some(GeometryObject::Polygon(rings)) => MultiPolygon::new(vec![polygon(i, rings)?]),
        Some(GeometryObject::MultiPolygon(polygons)) => MultiPolygon::new(
            polygons
                .into_iter()
                .map(|rings| polygon(i, rings))
                .collect::<Result<Vec<_>>>()?,
        ),
        None => {
            return Err(CleanerError::BoundaryLoad(format!(
                "feature {} ({}) has no geometry",
                i, names.department
            )))
        }
    };

    Ok(BoundaryRegion { names, geometry })
}

fn polygon(i: usize, rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter().map(|ring| line_string(i, ring));
    let exterior = rings.next().ok_or_else(|| {
        CleanerError::BoundaryLoad(format!("feature {} has a polygon without rings", i))
    })??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(i: usize, positions: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    positions
        .into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(CleanerError::BoundaryLoad(format!(
                "feature {} has a position with fewer than two values",
                i
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

/// Counts from one region join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    pub assigned: usize,
    pub unassigned: usize,
    /// Listings contained in more than one region
    pub overlaps: usize,
}

/// Left spatial join of listing points onto a borrowed boundary layer
pub struct RegionAssigner<'a> {
    layer: &'a BoundaryLayer,
}

impl<'a> RegionAssigner<'a> {
    pub fn new(layer: &'a BoundaryLayer) -> Self {
        Self { layer }
    }

    /// Attach region names; listings outside every polygon keep `region` unset
    pub fn run(&self, listings: &mut [Listing]) -> JoinOutcome {
        info!("Assigning country, state and department to farms...");
        let mut outcome = JoinOutcome::default();
        let mut by_department: BTreeMap<String, usize> = BTreeMap::new();

        for listing in listings.iter_mut() {
            let found = listing.geometry.as_ref().and_then(|p| self.layer.locate(p));
            match found {
                Some(matched) => {
                    if matched.overlapping > 0 {
                        warn!(
                            coordinates = listing.coordinates.as_deref().unwrap_or(""),
                            "Point lies in {} overlapping regions; using '{}' (boundary feature {})",
                            matched.overlapping + 1,
                            matched.region.names.department,
                            matched.layer_index
                        );
                        outcome.overlaps += 1;
                    }
                    *by_department
                        .entry(matched.region.names.department.clone())
                        .or_default() += 1;
                    listing.region = Some(matched.region.names.clone());
                    outcome.assigned += 1;
                }
                None => {
                    debug!(
                        "No region contains {}",
                        listing.coordinates.as_deref().unwrap_or("")
                    );
                    listing.region = None;
                    outcome.unassigned += 1;
                }
            }
        }

        info!(
            "Regions assigned: {} matched, {} outside all boundaries, {} overlaps",
            outcome.assigned, outcome.unassigned, outcome.overlaps
        );
        for (department, count) in &by_department {
            debug!("  {}: {}", department, count);
        }
        outcome
    }
}
