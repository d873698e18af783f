// Observability: stage counters for the cleaning pipeline

pub mod metrics;
