//! # `EmberVec` Manager
//!
//! Async layer over [`embervec_core`]: a [`VectorStore`] backend contract,
//! an injected [`BackendRegistry`], and the [`StoreManager`] that connects
//! the configured backend with a one-level fallback to the in-memory store.
//!
//! ## Features
//!
//! - **Fallback**: an unknown or failing backend is replaced by the memory
//!   backend, reported through [`StoreManager::info`]
//! - **Health**: side-effect-free latency check
//! - **Bounded shutdown**: disconnect is capped by a timeout
//! - **Normalization job**: re-normalize stored text and recompute vectors
//!   in committed batches

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod backend;
pub mod error;
pub mod manager;
pub mod memory;
pub mod normalize;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use backend::{BackendFactory, BackendRegistry, VectorStore};
pub use error::{ManagerError, Result};
pub use manager::{
    BackendInfo, ConnectionState, HealthReport, HealthStatus, ManagerConfig, ManagerInfo,
    StoreManager,
};
pub use memory::{MemoryBackend, MemoryBackendFactory};
pub use normalize::{BasicNormalizer, Embedder, NormalizeStats, TextNormalizer};
