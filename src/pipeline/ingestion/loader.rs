use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::{
    COL_ADDRESS, COL_CATEGORIES, COL_COORDINATES, COL_LINK, COL_MAIN_CATEGORY, COL_NAME,
    COL_PHONE, COL_WEBSITE, LISTING_COLUMNS,
};
use crate::error::{CleanerError, Result};
use crate::types::Listing;

/// Raw rows of a listing file, with the header they are keyed by
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
    /// Kept rows whose field count differs from the header
    pub ragged_rows: usize,
    /// Rows skipped because they could not be decoded
    pub unreadable_rows: usize,
}

impl RawTable {
    /// Position of the first column named `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads scraper output into a [`RawTable`]
pub struct ListingLoader;

impl ListingLoader {
    pub fn load_path(path: impl AsRef<Path>) -> Result<RawTable> {
        let path = path.as_ref();
        info!("Loading listings from {}", path.display());
        let file = File::open(path).map_err(|e| {
            CleanerError::DataSource(format!("cannot open {}: {}", path.display(), e))
        })?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Read a headed CSV stream; every listing column must be present.
    ///
    /// Short rows are kept and their missing cells read as empty. Rows that
    /// are not valid UTF-8 are skipped and counted.
    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| CleanerError::DataSource(format!("unreadable header row: {}", e)))?
            .clone();

        let missing: Vec<&str> = LISTING_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(CleanerError::DataSource(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut rows = Vec::new();
        let mut ragged_rows = 0;
        let mut unreadable_rows = 0;
        for (i, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                    warn!("Skipping unreadable row {}: {}", i + 1, e);
                    unreadable_rows += 1;
                    continue;
                }
                Err(e) => {
                    return Err(CleanerError::DataSource(format!(
                        "unreadable row {}: {}",
                        i + 1,
                        e
                    )))
                }
            };
            if record.len() != headers.len() {
                warn!(
                    "Row {} has {} fields, header has {}",
                    i + 1,
                    record.len(),
                    headers.len()
                );
                ragged_rows += 1;
            }
            rows.push(record);
        }

        Ok(RawTable {
            headers,
            rows,
            ragged_rows,
            unreadable_rows,
        })
    }
}

/// Result of restricting raw rows to the listing attributes
#[derive(Debug)]
pub struct Projection {
    pub listings: Vec<Listing>,
    pub dropped_columns: usize,
}

/// Keeps only the canonical listing attributes, bound by column name
pub struct ColumnProjector;

impl ColumnProjector {
    pub fn project(table: &RawTable) -> Result<Projection> {
        let index_of = |name: &str| {
            table.column_index(name).ok_or_else(|| {
                CleanerError::DataSource(format!("missing required column: {}", name))
            })
        };

        let name = index_of(COL_NAME)?;
        let website = index_of(COL_WEBSITE)?;
        let main_category = index_of(COL_MAIN_CATEGORY)?;
        let categories = index_of(COL_CATEGORIES)?;
        let phone = index_of(COL_PHONE)?;
        let address = index_of(COL_ADDRESS)?;
        let coordinates = index_of(COL_COORDINATES)?;
        let link = index_of(COL_LINK)?;

        let listings = table
            .rows
            .iter()
            .map(|row| Listing {
                name: cell(row, name),
                website: cell(row, website),
                main_category: cell(row, main_category),
                raw_categories: cell(row, categories),
                phone: cell(row, phone),
                address: cell(row, address),
                coordinates: cell(row, coordinates),
                link: cell(row, link),
                ..Default::default()
            })
            .collect();

        let dropped_columns = table.headers.len().saturating_sub(LISTING_COLUMNS.len());
        debug!("Projected {} rows onto listing columns", table.len());
        info!("Removed {} columns", dropped_columns);

        Ok(Projection {
            listings,
            dropped_columns,
        })
    }
}

/// Empty or absent cells become `None`
fn cell(row: &StringRecord, index: usize) -> Option<String> {
    row.get(index)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
place_id,link,name,rating,coordinates,main_category,categories,phone,address,website
p1,https://maps/1,Ferme A,4.5,\"48.85,2.35\",Dairy farm,\"Farm, Cattle farm\",0102,1 rue A,https://a.fr
p2,https://maps/2,Ferme B,,,Pig farm,,,,
";

    #[test]
    fn test_loader_binds_columns_by_name() {
        let table = ListingLoader::from_reader(RAW.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let projection = ColumnProjector::project(&table).unwrap();
        assert_eq!(projection.dropped_columns, 2);

        let first = &projection.listings[0];
        assert_eq!(first.name.as_deref(), Some("Ferme A"));
        assert_eq!(first.coordinates.as_deref(), Some("48.85,2.35"));
        assert_eq!(first.main_category.as_deref(), Some("Dairy farm"));
        assert_eq!(first.raw_categories.as_deref(), Some("Farm, Cattle farm"));
        assert_eq!(first.website.as_deref(), Some("https://a.fr"));
        assert_eq!(first.link.as_deref(), Some("https://maps/1"));
        assert!(first.categories.is_empty());
    }

    #[test]
    fn test_empty_cells_are_unset() {
        let table = ListingLoader::from_reader(RAW.as_bytes()).unwrap();
        let projection = ColumnProjector::project(&table).unwrap();

        let second = &projection.listings[1];
        assert_eq!(second.name.as_deref(), Some("Ferme B"));
        assert_eq!(second.coordinates, None);
        assert_eq!(second.raw_categories, None);
        assert_eq!(second.phone, None);
    }

    #[test]
    fn test_missing_column_is_data_source_error() {
        let raw = "name,website,main_category,categories,phone,address,link\nA,,,,,,\n";
        let err = ListingLoader::from_reader(raw.as_bytes()).unwrap_err();
        match err {
            CleanerError::DataSource(msg) => assert!(msg.contains("coordinates")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_padded_and_batch_continues() {
        let raw = "\
name,website,main_category,categories,phone,address,coordinates,link
A,,Dairy farm,Dairy farm,,,\"48.85,2.35\",https://maps/a
B,,Dairy farm
C,,Pig farm,Pig farm,,,\"45.0,4.0\",https://maps/c
";
        let table = ListingLoader::from_reader(raw.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.ragged_rows, 1);

        let projection = ColumnProjector::project(&table).unwrap();
        let short = &projection.listings[1];
        assert_eq!(short.name.as_deref(), Some("B"));
        assert_eq!(short.main_category.as_deref(), Some("Dairy farm"));
        assert_eq!(short.raw_categories, None);
        assert_eq!(short.coordinates, None);
        assert_eq!(projection.listings[2].name.as_deref(), Some("C"));
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let mut raw = b"name,website,main_category,categories,phone,address,coordinates,link\n".to_vec();
        raw.extend_from_slice(b"A,,Farm,,,,\"1,2\",\n");
        raw.extend_from_slice(b"B\xff,,Farm,,,,\"3,4\",\n");
        raw.extend_from_slice(b"C,,Farm,,,,\"5,6\",\n");

        let table = ListingLoader::from_reader(raw.as_slice()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.unreadable_rows, 1);
        assert_eq!(table.rows[1].get(0), Some("C"));
    }

    #[test]
    fn test_unreadable_path_is_data_source_error() {
        let err = ListingLoader::load_path("/no/such/listings.csv").unwrap_err();
        assert!(matches!(err, CleanerError::DataSource(_)));
    }
}
