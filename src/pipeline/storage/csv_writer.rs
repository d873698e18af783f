use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{CATEGORY_SEPARATOR, CLEANED_SUFFIX, OUTPUT_COLUMNS};
use crate::error::Result;
use crate::observability::metrics;
use crate::types::Listing;

/// `<dir>/<stem>_cleaned.csv` for an input at `<dir>/<stem>.csv`
pub fn cleaned_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "listings".to_string());
    input.with_file_name(format!("{}{}.csv", stem, CLEANED_SUFFIX))
}

/// One output row in `OUTPUT_COLUMNS` order.
///
/// Categories are joined with `", "`, geometry is WKT, unset values are empty.
pub fn listing_row(listing: &Listing) -> Vec<String> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let float = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    let region = listing.region.as_ref();

    vec![
        text(&listing.name),
        text(&listing.website),
        text(&listing.main_category),
        listing.categories.join(CATEGORY_SEPARATOR),
        text(&listing.phone),
        text(&listing.address),
        text(&listing.coordinates),
        text(&listing.link),
        float(listing.latitude),
        float(listing.longitude),
        listing
            .animal_type
            .map(|a| a.as_str().to_string())
            .unwrap_or_default(),
        listing
            .geometry
            .map(|p| format!("POINT ({} {})", p.x(), p.y()))
            .unwrap_or_default(),
        region.map(|r| r.country.clone()).unwrap_or_default(),
        region.map(|r| r.state.clone()).unwrap_or_default(),
        region.map(|r| r.department.clone()).unwrap_or_default(),
    ]
}

/// Writes cleaned listings as headed CSV.
///
/// Rows go to a temporary sibling first, which is renamed over `path` once
/// complete, so a failed write never leaves a partial output file.
pub struct CsvListingWriter;

impl CsvListingWriter {
    pub fn write(listings: &[Listing], path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("csv.tmp");
        let written = match Self::write_rows(listings, &tmp_path) {
            Ok(count) => count,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        metrics::storage::rows_written(written);
        info!("Cleaned data saved to {} ({} rows)", path.display(), written);
        Ok(written)
    }

    fn write_rows(listings: &[Listing], path: &Path) -> Result<usize> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(OUTPUT_COLUMNS)?;
        for listing in listings {
            writer.write_record(listing_row(listing))?;
        }
        writer.flush()?;
        Ok(listings.len())
    }
}
