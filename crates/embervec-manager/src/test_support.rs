//! Backend and embedder doubles used by the manager tests.

use crate::backend::{BackendFactory, VectorStore};
use crate::error::{ManagerError, Result};
use crate::memory::MemoryBackend;
use crate::normalize::Embedder;
use async_trait::async_trait;
use embervec_core::{
    Filter, ListPage, Payload, Point, ProviderRegistry, SearchResult, StoreConfig, StoreInfo,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Behaviour switches for [`ScriptedBackend`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Script {
    pub fail_connect: bool,
    pub fail_disconnect: bool,
    pub fail_count: bool,
    pub disconnect_delay: Option<Duration>,
}

/// Memory backend with scripted failures under another name.
pub struct ScriptedBackend {
    name: String,
    script: Script,
    inner: MemoryBackend,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait]
impl VectorStore for ScriptedBackend {
    fn backend_type(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<()> {
        if self.script.fail_connect {
            return Err(ManagerError::backend(&self.name, "connection refused"));
        }
        self.inner.connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.script.disconnect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_disconnect {
            return Err(ManagerError::backend(&self.name, "flush failed"));
        }
        self.inner.disconnect().await
    }

    async fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[u64],
        payloads: Vec<Payload>,
    ) -> Result<()> {
        self.inner.insert(vectors, ids, payloads).await
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchResult>> {
        self.inner.search(query, limit, filter).await
    }

    async fn get(&self, id: u64) -> Result<Option<Point>> {
        self.inner.get(id).await
    }

    async fn update(&self, id: u64, vector: Vec<f32>, payload: Payload) -> Result<()> {
        self.inner.update(id, vector, payload).await
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn delete_collection(&self) -> Result<()> {
        self.inner.delete_collection().await
    }

    async fn list(
        &self,
        filter: Option<&Filter>,
        limit: usize,
        offset: usize,
    ) -> Result<ListPage> {
        self.inner.list(filter, limit, offset).await
    }

    async fn count(&self) -> Result<usize> {
        if self.script.fail_count {
            return Err(ManagerError::backend(&self.name, "count failed"));
        }
        self.inner.count().await
    }

    async fn info(&self) -> Result<StoreInfo> {
        self.inner.info().await
    }
}

/// Factory for [`ScriptedBackend`]; counts disconnects of created backends.
#[derive(Clone)]
pub struct ScriptedFactory {
    pub name: String,
    pub script: Script,
    pub disconnects: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(name: &str, script: Script) -> Self {
        Self {
            name: name.to_string(),
            script,
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl BackendFactory for ScriptedFactory {
    fn create(&self, config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
        Ok(Arc::new(ScriptedBackend {
            name: self.name.clone(),
            script: self.script,
            inner: MemoryBackend::new(
                config.clone(),
                Arc::new(ProviderRegistry::with_defaults()),
            ),
            disconnects: Arc::clone(&self.disconnects),
        }))
    }
}

/// Embeds text as `[len, vowels, 1.0]`; fails on text containing "fail".
pub struct CountingEmbedder {
    pub calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
        vec![text.len() as f32, vowels as f32, 1.0]
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("fail") {
            anyhow::bail!("embedding model rejected input");
        }
        Ok(Self::vector_for(text))
    }
}
