use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::info;

use crate::constants::{COL_LATITUDE, COL_LONGITUDE, FARMS_TABLE, OUTPUT_COLUMNS};
use crate::error::{CleanerError, Result};

/// Loads cleaned listing files into the `Farms` table.
///
/// The table columns and the insert column list both come from
/// `OUTPUT_COLUMNS`, and a file whose header differs is rejected.
pub struct FarmsTable<'c> {
    conn: &'c mut Connection,
}

fn column_type(column: &str) -> &'static str {
    match column {
        COL_LATITUDE | COL_LONGITUDE => "REAL",
        _ => "TEXT",
    }
}

pub fn create_table_sql() -> String {
    let columns = OUTPUT_COLUMNS
        .iter()
        .map(|c| format!("{} {}", c, column_type(c)))
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    farm_id INTEGER PRIMARY KEY AUTOINCREMENT,\n    {}\n)",
        FARMS_TABLE, columns
    )
}

pub fn insert_sql() -> String {
    let placeholders = vec!["?"; OUTPUT_COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        FARMS_TABLE,
        OUTPUT_COLUMNS.join(", "),
        placeholders
    )
}

impl<'c> FarmsTable<'c> {
    /// Wrap a connection, creating the table if needed
    pub fn new(conn: &'c mut Connection) -> Result<Self> {
        conn.execute_batch(&create_table_sql())?;
        Ok(Self { conn })
    }

    /// Column names of the table, excluding the surrogate key
    pub fn columns(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", FARMS_TABLE))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names.into_iter().filter(|n| n != "farm_id").collect())
    }

    /// Insert every row of a cleaned CSV in one transaction
    pub fn load_csv(&mut self, path: &Path) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            CleanerError::DataSource(format!("cannot read {}: {}", path.display(), e))
        })?;
        let headers = reader.headers()?.clone();
        if !headers.iter().eq(OUTPUT_COLUMNS.iter().copied()) {
            return Err(CleanerError::DataSource(format!(
                "{} does not match the Farms schema: found [{}]",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&insert_sql())?;
            for record in reader.records() {
                let record = record?;
                let values = record
                    .iter()
                    .map(|v| if v.is_empty() { None } else { Some(v) });
                stmt.execute(params_from_iter(values))?;
                inserted += 1;
            }
        }
        tx.commit()?;

        info!("Inserted {} rows into {} from {}", inserted, FARMS_TABLE, path.display());
        Ok(inserted)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", FARMS_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Open (or create) the database file and load `csv_path` into it
pub fn load_into_database(csv_path: &Path, database: &Path) -> Result<usize> {
    let mut conn = Connection::open(database)?;
    let mut table = FarmsTable::new(&mut conn)?;
    table.load_csv(csv_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_table_columns_follow_output_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        let table = FarmsTable::new(&mut conn).unwrap();

        assert_eq!(table.columns().unwrap(), OUTPUT_COLUMNS.to_vec());
    }

    #[test]
    fn test_mismatched_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad_cleaned.csv");
        fs::write(&path, "name,coordinates\nA,\"1,2\"\n").unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        let mut table = FarmsTable::new(&mut conn).unwrap();
        let err = table.load_csv(&path).unwrap_err();

        assert!(matches!(err, CleanerError::DataSource(_)));
        assert_eq!(table.count().unwrap(), 0);
    }

    #[test]
    fn test_empty_cells_load_as_null() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("farms_cleaned.csv");
        let row = "A,,dairy_farm,cattle_farm,,,\"48.85,2.35\",,48.85,2.35,cows,POINT (2.35 48.85),,,";
        fs::write(&path, format!("{}\n{}\n", OUTPUT_COLUMNS.join(","), row)).unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        {
            let mut table = FarmsTable::new(&mut conn).unwrap();
            assert_eq!(table.load_csv(&path).unwrap(), 1);
        }

        let (website, latitude, country): (Option<String>, f64, Option<String>) = conn
            .query_row(
                "SELECT website, latitude, country FROM Farms",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(website, None);
        assert_eq!(latitude, 48.85);
        assert_eq!(country, None);
    }
}
