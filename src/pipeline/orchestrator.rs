use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::Taxonomy;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::{ColumnProjector, ListingLoader};
use crate::pipeline::processing::diagnostics::{animal_type_distribution, log_snapshot};
use crate::pipeline::processing::{
    AnimalClassifier, BoundaryLayer, CategoryFilter, CategoryNormalizer, Deduplicator,
    GeometryBuilder, RegionAssigner,
};
use crate::pipeline::storage::{cleaned_output_path, CsvListingWriter};
use crate::types::Listing;

/// Result of a complete cleaning run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub input_file: String,
    pub output_file: String,
    pub rows_loaded: usize,
    /// Rows with fewer or more fields than the header; kept, missing cells empty
    pub ragged_rows: usize,
    /// Rows skipped at load time because they could not be decoded
    pub unreadable_rows: usize,
    pub columns_dropped: usize,
    pub missing_coordinates: usize,
    pub duplicates: usize,
    pub outside_main_category_whitelist: usize,
    pub without_farm_keyword: usize,
    pub multiple_main_category: usize,
    pub malformed_coordinates: usize,
    pub region_unassigned: usize,
    pub region_overlaps: usize,
    pub rows_written: usize,
    /// Animal tags of the listings that reach the output
    pub animal_types: BTreeMap<String, usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineReport {
    /// Listings removed anywhere in the pipeline
    pub fn rows_dropped(&self) -> usize {
        self.unreadable_rows
            + self.missing_coordinates
            + self.duplicates
            + self.outside_main_category_whitelist
            + self.without_farm_keyword
            + self.malformed_coordinates
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn timed<T>(stage: &'static str, f: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let out = f();
    metrics::stage_duration(stage, started.elapsed().as_secs_f64());
    out
}

/// The cleaning pipeline over a borrowed taxonomy and boundary layer.
///
/// Stages run strictly in order over one in-memory batch. Only the final
/// write touches the filesystem, so any earlier failure leaves no output.
pub struct FarmPipeline<'a> {
    taxonomy: &'a Taxonomy,
    boundaries: &'a BoundaryLayer,
}

impl<'a> FarmPipeline<'a> {
    pub fn new(taxonomy: &'a Taxonomy, boundaries: &'a BoundaryLayer) -> Self {
        Self {
            taxonomy,
            boundaries,
        }
    }

    /// Stages 3 to 8 on already projected listings
    pub fn clean(&self, mut listings: Vec<Listing>, report: &mut PipelineReport) -> Vec<Listing> {
        let dedup = timed("dedup", || Deduplicator::run(&mut listings));
        report.missing_coordinates = dedup.missing_coordinates;
        report.duplicates = dedup.duplicates;
        metrics::records_dropped("dedup", "missing_coordinates", dedup.missing_coordinates);
        metrics::records_dropped("dedup", "duplicate", dedup.duplicates);

        let normalizer = CategoryNormalizer::new(self.taxonomy);
        timed("normalize", || normalizer.run(&mut listings));
        log_snapshot("normalize", &listings);

        let filter = CategoryFilter::new(self.taxonomy);
        let filtered = timed("category_filter", || filter.run(&mut listings));
        report.outside_main_category_whitelist = filtered.outside_broad;
        report.without_farm_keyword = filtered.no_farm_keyword;
        report.multiple_main_category = filtered.multiple;
        metrics::records_dropped("category_filter", "outside_whitelist", filtered.outside_broad);
        metrics::records_dropped("category_filter", "no_farm_keyword", filtered.no_farm_keyword);
        log_snapshot("category_filter", &listings);

        let classifier = AnimalClassifier::new(self.taxonomy);
        timed("animal_type", || classifier.run(&mut listings));

        let malformed = timed("geometry", || GeometryBuilder::run(&mut listings));
        report.malformed_coordinates = malformed;
        metrics::records_dropped("geometry", "malformed_coordinates", malformed);

        let assigner = RegionAssigner::new(self.boundaries);
        let joined = timed("region", || assigner.run(&mut listings));
        report.region_unassigned = joined.unassigned;
        report.region_overlaps = joined.overlaps;
        metrics::region::batch_joined(joined.assigned, joined.unassigned, joined.overlaps);
        log_snapshot("region", &listings);

        report.animal_types = animal_type_distribution(&listings);
        listings
    }

    /// Load `input`, clean it and write the result next to it (or to `output`)
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn run(&self, input: &Path, output: Option<&Path>) -> Result<PipelineReport> {
        let output: PathBuf = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cleaned_output_path(input));
        let mut report = PipelineReport {
            input_file: input.display().to_string(),
            output_file: output.display().to_string(),
            started_at: Some(Utc::now()),
            ..Default::default()
        };
        info!("Starting cleaning run");

        let table = timed("load", || ListingLoader::load_path(input))?;
        report.rows_loaded = table.len() + table.unreadable_rows;
        report.ragged_rows = table.ragged_rows;
        report.unreadable_rows = table.unreadable_rows;
        metrics::ingestion::rows_loaded(report.rows_loaded);
        metrics::records_dropped("load", "unreadable_row", table.unreadable_rows);

        let projection = timed("project", || ColumnProjector::project(&table))?;
        report.columns_dropped = projection.dropped_columns;
        drop(table);

        let listings = self.clean(projection.listings, &mut report);

        report.rows_written = timed("write", || CsvListingWriter::write(&listings, &output))?;
        report.finished_at = Some(Utc::now());

        info!(
            rows_loaded = report.rows_loaded,
            rows_written = report.rows_written,
            rows_dropped = report.rows_dropped(),
            "Cleaning process completed. Cleaned data saved to {}",
            report.output_file
        );
        Ok(report)
    }
}

/// Load reference data first, then run the pipeline.
///
/// A bad taxonomy or boundary file fails before the listings are read.
pub fn run_clean(
    input: &Path,
    boundaries: &Path,
    output: Option<&Path>,
    taxonomy: Option<&Path>,
) -> Result<PipelineReport> {
    let taxonomy = Taxonomy::load_or_default(taxonomy)?;
    let layer = BoundaryLayer::load(boundaries, &taxonomy.boundary_properties)?;
    FarmPipeline::new(&taxonomy, &layer).run(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::BoundaryRegion;
    use crate::types::{AnimalType, RegionNames};
    use geo::{LineString, MultiPolygon, Polygon};

    fn paris_layer() -> BoundaryLayer {
        let ring = LineString::from(vec![
            (2.2, 48.8),
            (2.5, 48.8),
            (2.5, 48.9),
            (2.2, 48.9),
            (2.2, 48.8),
        ]);
        BoundaryLayer::from_regions(vec![BoundaryRegion {
            names: RegionNames {
                country: "France".to_string(),
                state: "Île-de-France".to_string(),
                department: "Paris".to_string(),
            },
            geometry: MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
        }])
    }

    fn raw(name: &str, main: &str, categories: &str, coordinates: &str) -> Listing {
        Listing {
            name: Some(name.to_string()),
            main_category: Some(main.to_string()),
            raw_categories: Some(categories.to_string()).filter(|c| !c.is_empty()),
            coordinates: Some(coordinates.to_string()).filter(|c| !c.is_empty()),
            ..Default::default()
        }
    }

    #[test]
    fn test_dairy_farm_scenario() {
        let taxonomy = Taxonomy::default();
        let layer = paris_layer();
        let pipeline = FarmPipeline::new(&taxonomy, &layer);
        let mut report = PipelineReport::default();

        let cleaned = pipeline.clean(
            vec![raw("X", "Dairy farm", "Farm, Cattle farm", "48.85,2.35")],
            &mut report,
        );

        assert_eq!(cleaned.len(), 1);
        let farm = &cleaned[0];
        assert_eq!(farm.main_category.as_deref(), Some("dairy_farm"));
        assert_eq!(farm.categories, vec!["cattle_farm"]);
        assert_eq!(farm.animal_type, Some(AnimalType::Cows));
        let point = farm.geometry.unwrap();
        assert_eq!((point.x(), point.y()), (2.35, 48.85));
        let region = farm.region.as_ref().unwrap();
        assert_eq!(region.country, "France");
        assert_eq!(region.state, "Île-de-France");
        assert_eq!(region.department, "Paris");
    }

    #[test]
    fn test_ambiguous_livestock_scenario() {
        let taxonomy = Taxonomy::default();
        let layer = paris_layer();
        let pipeline = FarmPipeline::new(&taxonomy, &layer);
        let mut report = PipelineReport::default();

        let cleaned = pipeline.clean(
            vec![raw("Y", "Livestock", "Dairy, Pig farm", "45.0,4.0")],
            &mut report,
        );

        assert_eq!(cleaned.len(), 1);
        let farm = &cleaned[0];
        assert_eq!(farm.categories, vec!["dairy_farm", "pig_farm"]);
        assert_eq!(farm.main_category.as_deref(), Some("multiple"));
        assert_eq!(farm.animal_type, Some(AnimalType::Other));
        // Outside every boundary but still kept
        assert!(farm.region.is_none());
        assert_eq!(report.region_unassigned, 1);
        assert_eq!(report.multiple_main_category, 1);
    }

    #[test]
    fn test_report_accounts_for_every_drop() {
        let taxonomy = Taxonomy::default();
        let layer = paris_layer();
        let pipeline = FarmPipeline::new(&taxonomy, &layer);
        let mut report = PipelineReport::default();

        let input = vec![
            raw("keep", "Pig farm", "Pig farm", "48.85,2.35"),
            raw("dup", "Pig farm", "Pig farm", "48.85,2.35"),
            raw("nocoord", "Pig farm", "Pig farm", ""),
            raw("shop", "Garden center", "Pig farm", "48.86,2.36"),
            raw("generic", "Farm", "Farm, Organic farm", "48.87,2.37"),
            raw("garbled", "Fish farm", "Fish farm", "48.88;2.38"),
        ];
        let total = input.len();

        let cleaned = pipeline.clean(input, &mut report);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.missing_coordinates, 1);
        assert_eq!(report.outside_main_category_whitelist, 1);
        assert_eq!(report.without_farm_keyword, 1);
        assert_eq!(report.malformed_coordinates, 1);
        assert_eq!(report.rows_dropped() + cleaned.len(), total);
        assert_eq!(report.animal_types["pigs"], 1);
        // The garbled fish farm was tagged before its geometry failed
        assert!(!report.animal_types.contains_key("fish"));
        assert_eq!(report.animal_types.values().sum::<usize>(), cleaned.len());
    }
}
