use geo::Point;
use tracing::{info, warn};

use crate::error::{CleanerError, Result};
use crate::observability::metrics;
use crate::types::Listing;

/// Parse `"lat,lon"` into `(latitude, longitude)`.
///
/// Each component is trimmed before parsing. Values must be finite and within
/// the WGS-84 latitude/longitude ranges.
pub fn parse_coordinates(coordinates: &str) -> Result<(f64, f64)> {
    let malformed = |reason: &str| CleanerError::CoordinateFormat {
        coordinates: coordinates.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = coordinates.split(',').collect();
    let [lat, lon] = parts.as_slice() else {
        return Err(malformed("expected exactly two comma-separated components"));
    };

    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| malformed("latitude is not a number"))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| malformed("longitude is not a number"))?;

    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(malformed("latitude out of range"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(malformed("longitude out of range"));
    }

    Ok((latitude, longitude))
}

/// Builds EPSG:4326 points (x = longitude, y = latitude) from coordinates.
pub struct GeometryBuilder;

impl GeometryBuilder {
    pub fn build(listing: &mut Listing) -> Result<()> {
        let coordinates = listing.coordinates.as_deref().unwrap_or("");
        let (latitude, longitude) = parse_coordinates(coordinates)?;
        listing.latitude = Some(latitude);
        listing.longitude = Some(longitude);
        listing.geometry = Some(Point::new(longitude, latitude));
        Ok(())
    }

    /// Attach geometry to every listing; listings with malformed coordinates
    /// are dropped and logged. Returns the number dropped.
    pub fn run(listings: &mut Vec<Listing>) -> usize {
        info!("Building point geometries (EPSG:4326)...");
        let before = listings.len();

        listings.retain_mut(|listing| match Self::build(listing) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    name = listing.name.as_deref().unwrap_or(""),
                    "Dropping listing: {}", e
                );
                metrics::geometry::coordinate_error();
                false
            }
        });

        let dropped = before - listings.len();
        info!("Geometries built for {} listings ({} dropped)", listings.len(), dropped);
        dropped
    }
}
