//! Metrics for the farm cleaning pipeline
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use std::fmt;

/// All metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RowsLoaded,
    RecordsDropped,
    CoordinateErrors,
    RegionsAssigned,
    RegionsUnassigned,
    RegionOverlaps,
    RowsWritten,
    StageDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RowsLoaded => "farm_cleaner_rows_loaded_total",
            MetricName::RecordsDropped => "farm_cleaner_records_dropped_total",
            MetricName::CoordinateErrors => "farm_cleaner_coordinate_errors_total",
            MetricName::RegionsAssigned => "farm_cleaner_regions_assigned_total",
            MetricName::RegionsUnassigned => "farm_cleaner_regions_unassigned_total",
            MetricName::RegionOverlaps => "farm_cleaner_region_overlaps_total",
            MetricName::RowsWritten => "farm_cleaner_rows_written_total",
            MetricName::StageDuration => "farm_cleaner_stage_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record how long a stage took
pub fn stage_duration(stage: &'static str, secs: f64) {
    ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage).record(secs);
}

/// Record listings removed by a stage, labelled with the reason
pub fn records_dropped(stage: &'static str, reason: &'static str, count: usize) {
    if count == 0 {
        return;
    }
    ::metrics::counter!(
        MetricName::RecordsDropped.as_str(),
        "stage" => stage,
        "reason" => reason
    )
    .increment(count as u64);
}

pub mod ingestion {
    use super::MetricName;

    pub fn rows_loaded(count: usize) {
        ::metrics::counter!(MetricName::RowsLoaded.as_str()).increment(count as u64);
    }
}

pub mod geometry {
    use super::MetricName;

    pub fn coordinate_error() {
        ::metrics::counter!(MetricName::CoordinateErrors.as_str()).increment(1);
    }
}

pub mod region {
    use super::MetricName;

    pub fn batch_joined(assigned: usize, unassigned: usize, overlaps: usize) {
        ::metrics::counter!(MetricName::RegionsAssigned.as_str()).increment(assigned as u64);
        ::metrics::counter!(MetricName::RegionsUnassigned.as_str()).increment(unassigned as u64);
        ::metrics::counter!(MetricName::RegionOverlaps.as_str()).increment(overlaps as u64);
    }
}

pub mod storage {
    use super::MetricName;

    pub fn rows_written(count: usize) {
        ::metrics::counter!(MetricName::RowsWritten.as_str()).increment(count as u64);
    }
}
