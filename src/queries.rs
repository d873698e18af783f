use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::QueryTerms;
use crate::error::Result;
use crate::pipeline::processing::BoundaryLayer;

/// Search terms for the scraper: `"<farm type> in <department>, <state>"`
/// for every state (sorted), every farm type, and every department of the
/// state (boundary order).
pub fn generate_queries(layer: &BoundaryLayer, terms: &QueryTerms) -> Vec<String> {
    let mut queries = Vec::new();
    for (state, departments) in layer.departments_by_state() {
        for farm_type in &terms.farm_types {
            for department in &departments {
                queries.push(format!("{} in {}, {}", farm_type, department, state));
            }
        }
    }
    queries
}

/// Write queries as a single-column CSV with header `query`
pub fn write_queries(queries: &[String], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["query"])?;
    for query in queries {
        writer.write_record([query])?;
    }
    writer.flush()?;
    info!("Wrote {} search queries to {}", queries.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::BoundaryRegion;
    use crate::types::RegionNames;
    use geo::MultiPolygon;
    use tempfile::tempdir;

    fn region(state: &str, department: &str) -> BoundaryRegion {
        BoundaryRegion {
            names: RegionNames {
                country: "Austria".to_string(),
                state: state.to_string(),
                department: department.to_string(),
            },
            geometry: MultiPolygon::new(vec![]),
        }
    }

    #[test]
    fn test_queries_cover_every_state_term_and_department() {
        let layer = BoundaryLayer::from_regions(vec![
            region("Tirol", "Innsbruck"),
            region("Kärnten", "Villach"),
            region("Tirol", "Kufstein"),
        ]);
        let terms = QueryTerms {
            farm_types: vec!["dairy farms".to_string(), "pig farms".to_string()],
        };

        let queries = generate_queries(&layer, &terms);

        assert_eq!(
            queries,
            vec![
                "dairy farms in Villach, Kärnten",
                "pig farms in Villach, Kärnten",
                "dairy farms in Innsbruck, Tirol",
                "dairy farms in Kufstein, Tirol",
                "pig farms in Innsbruck, Tirol",
                "pig farms in Kufstein, Tirol",
            ]
        );
    }

    #[test]
    fn test_queries_file_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("farm_queries_AUT.csv");

        write_queries(&["dairy farms in Villach, Kärnten".to_string()], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "query\n\"dairy farms in Villach, Kärnten\"\n");
    }
}
