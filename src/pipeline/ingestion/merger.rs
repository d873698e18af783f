use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{MERGED_OUTPUT_DIR, SCRAPER_CSV_DIR};
use crate::error::{CleanerError, Result};

/// Summary of a merge run
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub files_merged: usize,
    pub empty_files_skipped: usize,
    pub rows_written: usize,
    pub columns: usize,
}

/// Concatenates the per-region scraper outputs found under
/// `<base>/<region>/csv/*.csv` into one file.
///
/// Columns are the union of all headers in first-seen order; cells a file
/// does not have are left empty.
pub struct RawFileMerger {
    base_dir: PathBuf,
}

impl RawFileMerger {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Find every non-empty scraper CSV, in sorted directory order
    pub fn discover(&self) -> Result<(Vec<PathBuf>, usize)> {
        let mut files = Vec::new();
        let mut empty = 0;

        for region_dir in sorted_entries(&self.base_dir)? {
            let is_merged_output = region_dir
                .file_name()
                .map(|n| n == MERGED_OUTPUT_DIR)
                .unwrap_or(false);
            if is_merged_output || !region_dir.is_dir() {
                continue;
            }
            debug!("Checking top directory: {}", region_dir.display());

            let csv_dir = region_dir.join(SCRAPER_CSV_DIR);
            if !csv_dir.is_dir() {
                continue;
            }

            for file in sorted_entries(&csv_dir)? {
                let is_csv = file.extension().map(|e| e == "csv").unwrap_or(false);
                if !is_csv || !file.is_file() {
                    continue;
                }
                if fs::metadata(&file)?.len() == 0 {
                    warn!("File is empty: {}", file.display());
                    empty += 1;
                    continue;
                }
                files.push(file);
            }
        }

        Ok((files, empty))
    }

    pub fn merge_into(&self, output: impl AsRef<Path>) -> Result<MergeSummary> {
        let output = output.as_ref();
        let (files, empty_files_skipped) = self.discover()?;
        if files.is_empty() {
            return Err(CleanerError::DataSource(format!(
                "no scraper CSV files found under {}",
                self.base_dir.display()
            )));
        }
        info!("Number of files to merge: {}", files.len());

        let mut columns: Vec<String> = Vec::new();
        let mut tables: Vec<(Vec<usize>, Vec<StringRecord>)> = Vec::new();

        for file in &files {
            let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(file)?;
            let headers = reader.headers()?.clone();

            // Column position in the merged header for each column of this file
            let mapping = headers
                .iter()
                .map(|h| {
                    let existing = columns.iter().position(|c| c == h);
                    existing.unwrap_or_else(|| {
                        columns.push(h.to_string());
                        columns.len() - 1
                    })
                })
                .collect::<Vec<_>>();

            let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
            debug!("Read {} rows from {}", rows.len(), file.display());
            tables.push((mapping, rows));
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(output)?;
        writer.write_record(&columns)?;

        let mut rows_written = 0;
        for (mapping, rows) in &tables {
            for row in rows {
                let mut merged = vec![""; columns.len()];
                for (value, &target) in row.iter().zip(mapping) {
                    merged[target] = value;
                }
                writer.write_record(&merged)?;
                rows_written += 1;
            }
        }
        writer.flush()?;

        info!("Merged CSV file saved as: {}", output.display());
        Ok(MergeSummary {
            files_merged: files.len(),
            empty_files_skipped,
            rows_written,
            columns: columns.len(),
        })
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| CleanerError::DataSource(format!("cannot read {}: {}", dir.display(), e)))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_merge_unions_headers_and_skips_all_dir() {
        let dir = tempdir().unwrap();
        let base = dir.path();
        write(&base.join("bretagne/csv/a.csv"), "name,coordinates\nA,\"1,2\"\n");
        write(&base.join("normandie/csv/b.csv"), "coordinates,name,phone\n\"3,4\",B,0102\n");
        write(&base.join("normandie/csv/empty.csv"), "");
        write(&base.join("normandie/csv/notes.txt"), "ignored");
        write(&base.join("all/csv/places-of-all.csv"), "name\nshould not appear\n");

        let output = base.join("merged/merged_raw_files.csv");
        let summary = RawFileMerger::new(base).merge_into(&output).unwrap();

        assert_eq!(summary.files_merged, 2);
        assert_eq!(summary.empty_files_skipped, 1);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.columns, 3);

        let merged = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines[0], "name,coordinates,phone");
        assert_eq!(lines[1], "A,\"1,2\",");
        assert_eq!(lines[2], "B,\"3,4\",0102");
    }

    #[test]
    fn test_short_scraper_row_is_padded() {
        let dir = tempdir().unwrap();
        let base = dir.path();
        write(&base.join("bretagne/csv/a.csv"), "name,coordinates,phone
A,\"1,2\",0102
B
");

        let output = base.join("merged.csv");
        let summary = RawFileMerger::new(base).merge_into(&output).unwrap();

        assert_eq!(summary.rows_written, 2);
        let merged = fs::read_to_string(&output).unwrap();
        assert_eq!(merged.lines().nth(2), Some("B,,"));
    }

    #[test]
    fn test_merge_without_inputs_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty_region/csv")).unwrap();
        let err = RawFileMerger::new(dir.path())
            .merge_into(dir.path().join("out.csv"))
            .unwrap_err();
        assert!(matches!(err, CleanerError::DataSource(_)));
    }
}
