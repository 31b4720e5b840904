//! Index configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default minimum number of stored vectors before the accelerated path is used.
pub const DEFAULT_MIN_DATASET_SIZE: usize = 1000;

/// Default maximum number of vectors per collection.
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Search algorithm requested for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Accelerated flat index, used once the dataset is large enough.
    #[default]
    Flat,
    /// Linear scan only; no accelerated index is ever constructed.
    #[serde(alias = "bruteforce", alias = "brute_force")]
    BruteForce,
}

impl Algorithm {
    /// Returns the stable name used in configuration and persisted metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::BruteForce => "brute-force",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of a [`VectorIndex`](super::VectorIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Algorithm choice.
    pub algorithm: Algorithm,
    /// Fixed vector dimension.
    pub dimension: usize,
    /// Maximum number of stored vectors.
    pub capacity: usize,
    /// Below this many vectors every search is a linear scan.
    pub min_dataset_size: usize,
    /// Directory holding the persisted snapshot, `None` disables persistence.
    pub persist_path: Option<PathBuf>,
}

impl IndexConfig {
    /// Creates a non-persistent flat configuration with default limits.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            algorithm: Algorithm::Flat,
            dimension,
            capacity: DEFAULT_CAPACITY,
            min_dataset_size: DEFAULT_MIN_DATASET_SIZE,
            persist_path: None,
        }
    }

    /// Sets the algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the minimum dataset size for accelerated search.
    #[must_use]
    pub fn with_min_dataset_size(mut self, min_dataset_size: usize) -> Self {
        self.min_dataset_size = min_dataset_size;
        self
    }

    /// Enables persistence under `path`.
    #[must_use]
    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Checks the configuration before any index is built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for a zero dimension and
    /// [`Error::Config`] for a zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::InvalidDimension(self.dimension));
        }
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be greater than 0".to_string()));
        }
        Ok(())
    }
}
