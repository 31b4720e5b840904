//! The in-memory backend.
//!
//! Wraps [`MemoryStore`]. Calls that touch the disk or scan the collection
//! run on the blocking pool, so an async caller can time them out; no store
//! lock is ever held across an `.await`.

use crate::backend::{BackendFactory, VectorStore};
use crate::error::{ManagerError, Result};
use async_trait::async_trait;
use embervec_core::{
    Filter, ListPage, MemoryStore, Payload, Point, ProviderRegistry, SearchResult, StoreConfig,
    StoreInfo, MEMORY_BACKEND,
};
use std::sync::Arc;

/// [`VectorStore`] backed by a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryBackend {
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    /// Creates a disconnected backend.
    #[must_use]
    pub fn new(config: StoreConfig, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            store: Arc::new(MemoryStore::new(config, providers)),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Runs a store call on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&MemoryStore) -> embervec_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| ManagerError::backend(MEMORY_BACKEND, format!("Task join error: {e}")))?
            .map_err(ManagerError::from)
    }
}

#[async_trait]
impl VectorStore for MemoryBackend {
    fn backend_type(&self) -> &str {
        MEMORY_BACKEND
    }

    async fn connect(&self) -> Result<()> {
        self.blocking(MemoryStore::connect).await
    }

    async fn disconnect(&self) -> Result<()> {
        self.blocking(MemoryStore::disconnect).await
    }

    async fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[u64],
        payloads: Vec<Payload>,
    ) -> Result<()> {
        let vectors = vectors.to_vec();
        let ids = ids.to_vec();
        self.blocking(move |store| store.insert(&vectors, &ids, payloads))
            .await
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchResult>> {
        let query = query.to_vec();
        let filter = filter.cloned();
        self.blocking(move |store| store.search(&query, limit, filter.as_ref()))
            .await
    }

    async fn get(&self, id: u64) -> Result<Option<Point>> {
        Ok(self.store.get(id)?)
    }

    async fn update(&self, id: u64, vector: Vec<f32>, payload: Payload) -> Result<()> {
        self.blocking(move |store| store.update(id, vector, payload))
            .await
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        self.blocking(move |store| store.delete(id)).await
    }

    async fn delete_collection(&self) -> Result<()> {
        self.blocking(MemoryStore::delete_collection).await
    }

    async fn list(
        &self,
        filter: Option<&Filter>,
        limit: usize,
        offset: usize,
    ) -> Result<ListPage> {
        let filter = filter.cloned();
        self.blocking(move |store| store.list(filter.as_ref(), limit, offset))
            .await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.count()?)
    }

    async fn info(&self) -> Result<StoreInfo> {
        Ok(self.store.info()?)
    }
}

/// Factory for [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct MemoryBackendFactory {
    providers: Arc<ProviderRegistry>,
}

impl MemoryBackendFactory {
    /// Creates a factory resolving accelerated indexes through `providers`.
    #[must_use]
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }
}

impl BackendFactory for MemoryBackendFactory {
    fn create(&self, config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
        Ok(Arc::new(MemoryBackend::new(
            config.clone(),
            Arc::clone(&self.providers),
        )))
    }
}
