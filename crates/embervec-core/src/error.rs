//! Error types for `EmberVec`.
//!
//! Structural and input errors are always returned to the caller. Failures of
//! the accelerated index are reported through [`Error::AnnUnavailable`] and
//! [`Error::Ann`], but the index absorbs them and degrades to linear scan, so
//! callers only see them when talking to a provider directly.

use thiserror::Error;

/// Result type alias for `EmberVec` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `EmberVec` operations.
///
/// Error codes follow the pattern `EMBER-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector dimension mismatch (EMBER-001).
    #[error("[EMBER-001] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Invalid collection dimension (EMBER-002).
    #[error("[EMBER-002] Invalid dimension: {0}")]
    InvalidDimension(usize),

    /// Parallel input arrays disagree in length (EMBER-003).
    #[error("[EMBER-003] Length mismatch: {0}")]
    LengthMismatch(String),

    /// The same id appears twice in one batch (EMBER-004).
    #[error("[EMBER-004] Duplicate id {0} in batch")]
    DuplicateId(u64),

    /// Insert would exceed the collection capacity (EMBER-005).
    #[error("[EMBER-005] Capacity exceeded: capacity {capacity}, requested {requested}")]
    CapacityExceeded {
        /// Configured maximum number of vectors.
        capacity: usize,
        /// Number of vectors the collection would hold after the insert.
        requested: usize,
    },

    /// Operation on a disconnected store (EMBER-006).
    #[error("[EMBER-006] Store '{0}' is not connected")]
    NotConnected(String),

    /// Point not found (EMBER-007).
    #[error("[EMBER-007] Point with ID '{0}' not found")]
    PointNotFound(u64),

    /// Filter could not be built (EMBER-008).
    #[error("[EMBER-008] Invalid filter: {0}")]
    InvalidFilter(String),

    /// Accelerated index provider is not available (EMBER-009).
    #[error("[EMBER-009] Accelerated index unavailable: {0}")]
    AnnUnavailable(String),

    /// Accelerated index operation failed (EMBER-010).
    #[error("[EMBER-010] Accelerated index error: {0}")]
    Ann(String),

    /// IO error (EMBER-011).
    #[error("[EMBER-011] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (EMBER-012).
    #[error("[EMBER-012] Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (EMBER-013).
    #[error("[EMBER-013] Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code (e.g., "EMBER-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "EMBER-001",
            Self::InvalidDimension(_) => "EMBER-002",
            Self::LengthMismatch(_) => "EMBER-003",
            Self::DuplicateId(_) => "EMBER-004",
            Self::CapacityExceeded { .. } => "EMBER-005",
            Self::NotConnected(_) => "EMBER-006",
            Self::PointNotFound(_) => "EMBER-007",
            Self::InvalidFilter(_) => "EMBER-008",
            Self::AnnUnavailable(_) => "EMBER-009",
            Self::Ann(_) => "EMBER-010",
            Self::Io(_) => "EMBER-011",
            Self::Serialization(_) => "EMBER-012",
            Self::Config(_) => "EMBER-013",
        }
    }

    /// Returns true if the error was caused by caller input rather than
    /// infrastructure, i.e. retrying with the same arguments cannot succeed.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::InvalidDimension(_)
                | Self::LengthMismatch(_)
                | Self::DuplicateId(_)
                | Self::CapacityExceeded { .. }
                | Self::PointNotFound(_)
                | Self::InvalidFilter(_)
        )
    }

    /// Returns true if this error is recoverable.
    ///
    /// Acceleration failures are always recoverable: the index falls back to
    /// linear scan.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Serialization(_) | Self::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
