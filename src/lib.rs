//! Cleaning and geo-enrichment pipeline for scraped farm business listings.
//!
//! Raw listing CSVs go through projection, deduplication, category
//! normalization and filtering, animal-type tagging, point construction and a
//! point-in-polygon region join, and come out as a cleaned CSV ready for the
//! `Farms` SQLite table.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod queries;
pub mod types;

pub use config::Taxonomy;
pub use error::{CleanerError, Result};
pub use pipeline::{run_clean, FarmPipeline, PipelineReport};
pub use types::{AnimalType, Listing, RegionNames};
