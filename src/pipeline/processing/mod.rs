// Pipeline processing: dedup, category cleanup, classification and geo enrichment

pub mod animal;
pub mod category_filter;
pub mod dedup;
pub mod diagnostics;
pub mod geometry;
pub mod normalize;
pub mod region;

pub use animal::AnimalClassifier;
pub use category_filter::{CategoryFilter, FilterDecision, FilterOutcome};
pub use dedup::{DedupOutcome, Deduplicator};
pub use geometry::{parse_coordinates, GeometryBuilder};
pub use normalize::CategoryNormalizer;
pub use region::{BoundaryLayer, BoundaryRegion, JoinOutcome, RegionAssigner, RegionMatch};
