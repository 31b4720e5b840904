//! Index observability. Nothing in the crate makes correctness decisions
//! from these values.

use super::params::Algorithm;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics of the most recent search call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    /// Wall time of the call.
    pub duration: Duration,
    /// Number of results returned.
    pub result_count: usize,
    /// Whether the accelerated path answered.
    pub from_ann: bool,
    /// Whether the accelerated path failed and the call fell back to linear scan.
    pub degraded: bool,
}

/// Snapshot of index state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored vectors.
    pub vector_count: usize,
    /// Whether the next search would use the accelerated path.
    pub ann_active: bool,
    /// Whether an accelerated index is built and healthy.
    pub ann_available: bool,
    /// Configured algorithm.
    pub algorithm: Algorithm,
    /// Name of the resolved provider.
    pub provider: String,
    /// Dataset size threshold for the accelerated path.
    pub min_dataset_size: usize,
    /// Duration of the last accelerated index (re)build.
    pub last_build: Option<Duration>,
    /// Metrics of the last search.
    pub last_search: Option<SearchMetrics>,
}
