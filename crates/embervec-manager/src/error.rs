//! Error types for the store manager.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;

/// Errors raised by the store manager and its backends.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Error from the core engine (EMBER-101).
    #[error("[EMBER-101] Store error: {0}")]
    Store(#[from] embervec_core::Error),

    /// No factory registered under the requested name (EMBER-102).
    #[error("[EMBER-102] Unknown backend '{0}'")]
    UnknownBackend(String),

    /// Backend-specific failure (EMBER-103).
    #[error("[EMBER-103] Backend '{backend}' failed: {message}")]
    Backend {
        /// Backend name.
        backend: String,
        /// Failure description.
        message: String,
    },

    /// Backend disconnect exceeded the shutdown timeout (EMBER-104).
    #[error("[EMBER-104] Backend shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),

    /// Operation requires a connected manager (EMBER-105).
    #[error("[EMBER-105] Store manager is not connected")]
    NotConnected,

    /// The embedder failed (EMBER-106).
    #[error("[EMBER-106] Embedding failed: {0}")]
    Embedding(String),
}

impl ManagerError {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "EMBER-101",
            Self::UnknownBackend(_) => "EMBER-102",
            Self::Backend { .. } => "EMBER-103",
            Self::ShutdownTimeout(_) => "EMBER-104",
            Self::NotConnected => "EMBER-105",
            Self::Embedding(_) => "EMBER-106",
        }
    }

    /// Creates a [`ManagerError::Backend`].
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
