// Pipeline storage: cleaned CSV output and the SQLite Farms table

pub mod csv_writer;
pub mod sqlite;

pub use csv_writer::{cleaned_output_path, listing_row, CsvListingWriter};
pub use sqlite::{load_into_database, FarmsTable};
