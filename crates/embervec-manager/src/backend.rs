//! Backend contract and registry.

use crate::error::{ManagerError, Result};
use crate::memory::MemoryBackendFactory;
use async_trait::async_trait;
use embervec_core::{
    Filter, ListPage, Payload, Point, ProviderRegistry, SearchResult, StoreConfig, StoreInfo,
    MEMORY_BACKEND,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A vector store backend.
///
/// Implement this trait to plug a new storage service into the
/// [`StoreManager`](crate::StoreManager).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name.
    fn backend_type(&self) -> &str;

    /// Opens the backend. Idempotent.
    async fn connect(&self) -> Result<()>;

    /// Flushes and closes the backend. Idempotent.
    async fn disconnect(&self) -> Result<()>;

    /// Inserts points; the three inputs have equal lengths.
    async fn insert(&self, vectors: &[Vec<f32>], ids: &[u64], payloads: Vec<Payload>)
        -> Result<()>;

    /// Returns up to `limit` results by descending score.
    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchResult>>;

    /// Returns the point stored under `id`.
    async fn get(&self, id: u64) -> Result<Option<Point>>;

    /// Replaces the vector and payload of an existing point.
    async fn update(&self, id: u64, vector: Vec<f32>, payload: Payload) -> Result<()>;

    /// Deletes a point, returning whether it existed.
    async fn delete(&self, id: u64) -> Result<bool>;

    /// Removes every point of the collection.
    async fn delete_collection(&self) -> Result<()>;

    /// Lists points in ascending id order.
    async fn list(&self, filter: Option<&Filter>, limit: usize, offset: usize)
        -> Result<ListPage>;

    /// Number of stored points.
    async fn count(&self) -> Result<usize>;

    /// Summary of the backend's collection.
    async fn info(&self) -> Result<StoreInfo>;
}

/// Creates backends of one kind.
pub trait BackendFactory: Send + Sync {
    /// Creates a disconnected backend for `config`.
    fn create(&self, config: &StoreConfig) -> Result<Arc<dyn VectorStore>>;
}

/// Registry of backend factories by name.
///
/// The memory backend is always registered. Built once at startup and
/// injected into the manager.
#[derive(Clone)]
pub struct BackendRegistry {
    factories: HashMap<String, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// Creates a registry with the memory backend and the default
    /// accelerated index providers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_providers(Arc::new(ProviderRegistry::with_defaults()))
    }

    /// Creates a registry whose memory backend resolves accelerated indexes
    /// through `providers`.
    #[must_use]
    pub fn with_providers(providers: Arc<ProviderRegistry>) -> Self {
        let mut factories: HashMap<String, Arc<dyn BackendFactory>> = HashMap::new();
        factories.insert(
            MEMORY_BACKEND.to_string(),
            Arc::new(MemoryBackendFactory::new(providers)),
        );
        Self { factories }
    }

    /// Registers (or replaces) a factory.
    ///
    /// The memory backend can be replaced but never removed.
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn BackendFactory>) {
        self.factories.insert(name.into(), factory);
    }

    /// Returns true if a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Creates a disconnected backend.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownBackend`] if nothing is registered
    /// under `name`, or the factory's own error.
    pub fn create(&self, name: &str, config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ManagerError::UnknownBackend(name.to_string()))?;
        factory.create(config)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
