//! Vector index with an optional accelerated path.
//!
//! # Module Organization
//!
//! - `params`: Algorithm choice and index configuration
//! - `provider`: Accelerated index traits and the provider registry
//! - `flat`: Built-in flat accelerated index
//! - `persistence`: On-disk layout of a saved index
//! - `vector_index`: `VectorIndex`, the linear-scan/accelerated policy

// ============================================================================
// Core modules
// ============================================================================
mod flat;
mod params;
pub(crate) mod persistence;
mod provider;
mod stats;
mod vector_index;

#[cfg(test)]
mod test_support;

// ============================================================================
// Public API
// ============================================================================
pub use flat::{FlatIndex, FlatProvider};
pub use params::{Algorithm, IndexConfig, DEFAULT_CAPACITY, DEFAULT_MIN_DATASET_SIZE};
pub use provider::{AnnHits, AnnIndex, AnnProvider, ProviderRegistry, UnavailableProvider};
pub use stats::{IndexStats, SearchMetrics};
pub use vector_index::{IndexHit, VectorIndex, ANN_OVERFETCH_FACTOR};
