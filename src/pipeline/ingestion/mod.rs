// Pipeline ingestion: reading raw listing files and merging scraper outputs

pub mod loader;
pub mod merger;

pub use loader::{ColumnProjector, ListingLoader, Projection, RawTable};
pub use merger::RawFileMerger;
