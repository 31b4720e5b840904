//! Accelerated index providers.
//!
//! An [`AnnProvider`] is a capability-checked factory for accelerated
//! indexes. Availability is checked explicitly with
//! [`AnnProvider::is_available`]; an unavailable provider is a normal value
//! ([`UnavailableProvider`]), so linear scan is simply what a
//! [`VectorIndex`](super::VectorIndex) does when it has no accelerated index.
//!
//! Providers are resolved through a [`ProviderRegistry`] built once at
//! startup and passed down explicitly.

use super::params::Algorithm;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Raw hits returned by an accelerated index, nearest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnHits {
    /// Ids of the hits.
    pub ids: Vec<u64>,
    /// Provider-specific distances, lower is closer.
    pub distances: Vec<f32>,
}

/// An accelerated (id, vector) index.
pub trait AnnIndex: Send + Sync {
    /// Vector dimension the index was built for.
    fn dimension(&self) -> usize;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    /// Returns true if the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers vectors under caller-assigned ids.
    fn add_with_ids(&mut self, vectors: &[Vec<f32>], ids: &[u64]) -> Result<()>;

    /// Returns up to `k` nearest ids with their distances.
    fn search(&self, query: &[f32], k: usize) -> Result<AnnHits>;

    /// Whether [`AnnIndex::remove_ids`] removes entries individually.
    ///
    /// When false, callers rebuild the index from their own copy of the data.
    fn supports_remove(&self) -> bool {
        true
    }

    /// Removes ids, returning how many were present.
    fn remove_ids(&mut self, ids: &[u64]) -> Result<usize>;

    /// Removes every vector.
    fn reset(&mut self) -> Result<()>;

    /// Writes a snapshot readable by [`AnnProvider::read_index`].
    fn write_index(&self, path: &Path) -> Result<()>;
}

/// Factory for accelerated indexes.
pub trait AnnProvider: Send + Sync {
    /// Provider name reported in stats.
    fn name(&self) -> &str;

    /// Checks whether the provider can build indexes in this process.
    fn is_available(&self) -> bool;

    /// Constructs an empty flat index.
    fn create_flat(&self, dimension: usize) -> Result<Box<dyn AnnIndex>>;

    /// Reads a snapshot written by [`AnnIndex::write_index`].
    fn read_index(&self, path: &Path, dimension: usize) -> Result<Box<dyn AnnIndex>>;
}

/// Provider that is never available.
///
/// Stands in when the configured algorithm is brute force, or when no
/// accelerated provider is registered.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    /// Creates an unavailable provider with the reason reported in errors.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AnnProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn create_flat(&self, _dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Err(Error::AnnUnavailable(self.reason.clone()))
    }

    fn read_index(&self, _path: &Path, _dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Err(Error::AnnUnavailable(self.reason.clone()))
    }
}

/// Registry mapping algorithms to accelerated providers.
///
/// Built once at startup and shared by `Arc`; there is no process-wide
/// provider cache.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Algorithm, Arc<dyn AnnProvider>>,
}

impl ProviderRegistry {
    /// Creates a registry without any accelerated provider.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in flat provider.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Algorithm::Flat, Arc::new(super::flat::FlatProvider));
        registry
    }

    /// Registers (or replaces) the provider for an algorithm.
    ///
    /// Registering for [`Algorithm::BruteForce`] has no effect on resolution:
    /// brute force never uses a provider.
    pub fn register(&mut self, algorithm: Algorithm, provider: Arc<dyn AnnProvider>) {
        self.providers.insert(algorithm, provider);
    }

    /// Resolves the provider for an algorithm.
    #[must_use]
    pub fn resolve(&self, algorithm: Algorithm) -> Arc<dyn AnnProvider> {
        match algorithm {
            Algorithm::BruteForce => Arc::new(UnavailableProvider::new(
                "brute-force algorithm configured",
            )),
            Algorithm::Flat => self.providers.get(&algorithm).cloned().unwrap_or_else(|| {
                Arc::new(UnavailableProvider::new(format!(
                    "no provider registered for '{algorithm}'"
                )))
            }),
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: HashMap<&Algorithm, &str> =
            self.providers.iter().map(|(a, p)| (a, p.name())).collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}
