// Data processing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;

// Re-export the pipeline entry points
pub use orchestrator::{run_clean, FarmPipeline, PipelineReport};
