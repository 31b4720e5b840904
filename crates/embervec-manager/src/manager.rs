//! Store manager: backend selection with one-level fallback, health and
//! bounded shutdown.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!                               │
//!                             failed
//!                               ▼
//!                       ConnectingFallback ──ok──▶ ConnectedFallback
//!                               │
//!                             failed ──▶ Disconnected
//! ```

use crate::backend::{BackendRegistry, VectorStore};
use crate::error::{ManagerError, Result};
use crate::normalize::{self, BasicNormalizer, Embedder, NormalizeStats};
use embervec_core::{EmberConfig, NormalizationConfig, StoreConfig, StoreInfo, MEMORY_BACKEND};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Manager configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Store configuration handed to the backend factory.
    pub store: StoreConfig,
    /// Upper bound for a backend disconnect.
    pub shutdown_timeout: Duration,
    /// Default page size of the normalization job.
    pub normalize_batch_size: usize,
}

impl ManagerConfig {
    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            shutdown_timeout: Duration::from_secs(5),
            normalize_batch_size: 100,
        }
    }

    /// Sets the shutdown timeout.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl From<&EmberConfig> for ManagerConfig {
    fn from(config: &EmberConfig) -> Self {
        Self {
            store: config.store.clone(),
            shutdown_timeout: Duration::from_millis(config.manager.shutdown_timeout_ms),
            normalize_batch_size: config.manager.normalize_batch_size,
        }
    }
}

/// Connection state of a [`StoreManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No backend.
    Disconnected,
    /// Connecting the requested backend.
    Connecting,
    /// The requested backend is live.
    Connected,
    /// The requested backend failed; connecting the memory backend.
    ConnectingFallback,
    /// The memory backend is live in place of the requested one.
    ConnectedFallback,
}

impl ConnectionState {
    /// Returns true in either connected state.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::ConnectedFallback)
    }
}

/// Overall health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The requested backend answers.
    Healthy,
    /// The fallback backend answers.
    Degraded,
    /// The live backend failed the health check.
    Unhealthy,
    /// No backend is connected.
    Disconnected,
}

/// Result of [`StoreManager::health_check`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Live backend name.
    pub backend: Option<String>,
    /// Whether the live backend is the fallback.
    pub fallback: bool,
    /// Round trip of the health check.
    pub latency: Option<Duration>,
    /// Health check error, if any.
    pub error: Option<String>,
}

/// Backend section of [`ManagerInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Configured backend name.
    pub requested: String,
    /// Live backend name.
    pub active: Option<String>,
    /// Whether the live backend is the fallback.
    pub fallback: bool,
    /// Summary reported by the live backend.
    pub store: Option<StoreInfo>,
}

/// Result of [`StoreManager::info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerInfo {
    /// Connection state.
    pub state: ConnectionState,
    /// Backend details.
    pub backend: BackendInfo,
    /// Number of connect attempts that reached a backend.
    pub connect_attempts: u64,
    /// Most recent connect or disconnect error.
    pub last_error: Option<String>,
}

struct Inner {
    state: ConnectionState,
    store: Option<Arc<dyn VectorStore>>,
    active_backend: Option<String>,
    fallback: bool,
    connect_attempts: u64,
    last_error: Option<String>,
}

/// Owns the live backend and its lifecycle.
///
/// Connect and disconnect are serialized; state snapshots are taken under a
/// short synchronous lock that is never held across an `.await`.
///
/// # Example
///
/// ```rust
/// use embervec_core::StoreConfig;
/// use embervec_manager::{BackendRegistry, ManagerConfig, StoreManager};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> embervec_manager::Result<()> {
/// let manager = StoreManager::new(
///     ManagerConfig::new(StoreConfig::new("notes", 3)),
///     Arc::new(BackendRegistry::new()),
/// );
/// let store = manager.connect().await?;
/// store.insert(&[vec![1.0, 0.0, 0.0]], &[1], vec![Default::default()]).await?;
/// assert_eq!(manager.health_check().await.backend.as_deref(), Some("memory"));
/// manager.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct StoreManager {
    config: ManagerConfig,
    registry: Arc<BackendRegistry>,
    lifecycle: Mutex<()>,
    inner: RwLock<Inner>,
}

impl StoreManager {
    /// Creates a disconnected manager.
    #[must_use]
    pub fn new(config: ManagerConfig, registry: Arc<BackendRegistry>) -> Self {
        Self {
            config,
            registry,
            lifecycle: Mutex::new(()),
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                store: None,
                active_backend: None,
                fallback: false,
                connect_attempts: 0,
                last_error: None,
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.read().state
    }

    /// Returns the live backend.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotConnected`] when disconnected.
    pub fn store(&self) -> Result<Arc<dyn VectorStore>> {
        self.inner
            .read()
            .store
            .clone()
            .ok_or(ManagerError::NotConnected)
    }

    /// Connects the configured backend, falling back once to the memory
    /// backend. Idempotent while connected.
    ///
    /// # Errors
    ///
    /// Returns the original backend error when the requested backend is the
    /// memory backend, or when the fallback fails too.
    pub async fn connect(&self) -> Result<Arc<dyn VectorStore>> {
        let _lifecycle = self.lifecycle.lock().await;
        if let Ok(store) = self.store() {
            return Ok(store);
        }

        let requested = self.config.store.backend.clone();
        self.begin(ConnectionState::Connecting);

        let err = match self.open_backend(&requested).await {
            Ok(store) => {
                info!(backend = %requested, "Store manager connected");
                return Ok(self.finish(store, &requested, false));
            }
            Err(err) => err,
        };
        self.inner.write().last_error = Some(err.to_string());

        if requested == MEMORY_BACKEND {
            warn!(error = %err, "Memory backend failed to connect");
            self.inner.write().state = ConnectionState::Disconnected;
            return Err(err);
        }

        warn!(
            backend = %requested,
            error = %err,
            "Backend unavailable, falling back to the memory backend"
        );
        self.begin(ConnectionState::ConnectingFallback);
        match self.open_backend(MEMORY_BACKEND).await {
            Ok(store) => {
                info!(requested = %requested, "Store manager connected to fallback backend");
                Ok(self.finish(store, MEMORY_BACKEND, true))
            }
            Err(fallback_err) => {
                warn!(error = %fallback_err, "Fallback backend failed to connect");
                let mut inner = self.inner.write();
                inner.state = ConnectionState::Disconnected;
                inner.last_error = Some(fallback_err.to_string());
                Err(err)
            }
        }
    }

    fn begin(&self, state: ConnectionState) {
        let mut inner = self.inner.write();
        inner.state = state;
        inner.connect_attempts += 1;
    }

    fn finish(&self, store: Arc<dyn VectorStore>, backend: &str, fallback: bool) -> Arc<dyn VectorStore> {
        let mut inner = self.inner.write();
        inner.state = if fallback {
            ConnectionState::ConnectedFallback
        } else {
            ConnectionState::Connected
        };
        inner.store = Some(Arc::clone(&store));
        inner.active_backend = Some(backend.to_string());
        inner.fallback = fallback;
        store
    }

    /// Creates and connects a backend, disconnecting it again on failure.
    async fn open_backend(&self, name: &str) -> Result<Arc<dyn VectorStore>> {
        let store = self.registry.create(name, &self.config.store)?;
        if let Err(err) = store.connect().await {
            if let Err(cleanup) = store.disconnect().await {
                debug!(backend = name, error = %cleanup, "Cleanup of failed backend also failed");
            }
            return Err(err);
        }
        Ok(store)
    }

    /// Disconnects the live backend within the shutdown timeout.
    ///
    /// The manager is `Disconnected` afterwards even when this returns an
    /// error. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the backend's disconnect error, or
    /// [`ManagerError::ShutdownTimeout`].
    pub async fn disconnect(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        let store = {
            let mut inner = self.inner.write();
            inner.state = ConnectionState::Disconnected;
            inner.active_backend = None;
            inner.fallback = false;
            inner.store.take()
        };
        let Some(store) = store else {
            return Ok(());
        };

        let timeout = self.config.shutdown_timeout;
        let result = match tokio::time::timeout(timeout, store.disconnect()).await {
            Ok(result) => result,
            Err(_) => Err(ManagerError::ShutdownTimeout(timeout)),
        };
        match &result {
            Ok(()) => info!(backend = store.backend_type(), "Store manager disconnected"),
            Err(err) => {
                warn!(backend = store.backend_type(), error = %err, "Backend disconnect failed");
                self.inner.write().last_error = Some(err.to_string());
            }
        }
        result
    }

    /// Checks the live backend with a `count()` call. Never changes state.
    pub async fn health_check(&self) -> HealthReport {
        let (store, backend, fallback) = {
            let inner = self.inner.read();
            (inner.store.clone(), inner.active_backend.clone(), inner.fallback)
        };
        let Some(store) = store else {
            return HealthReport {
                status: HealthStatus::Disconnected,
                backend: None,
                fallback: false,
                latency: None,
                error: None,
            };
        };

        let start = Instant::now();
        let outcome = store.count().await;
        let latency = start.elapsed();

        let (status, error) = match outcome {
            Ok(_) if fallback => (HealthStatus::Degraded, None),
            Ok(_) => (HealthStatus::Healthy, None),
            Err(err) => (HealthStatus::Unhealthy, Some(err.to_string())),
        };
        HealthReport {
            status,
            backend,
            fallback,
            latency: Some(latency),
            error,
        }
    }

    /// Describes the manager and its live backend.
    pub async fn info(&self) -> ManagerInfo {
        let (store, mut info) = {
            let inner = self.inner.read();
            (
                inner.store.clone(),
                ManagerInfo {
                    state: inner.state,
                    backend: BackendInfo {
                        requested: self.config.store.backend.clone(),
                        active: inner.active_backend.clone(),
                        fallback: inner.fallback,
                        store: None,
                    },
                    connect_attempts: inner.connect_attempts,
                    last_error: inner.last_error.clone(),
                },
            )
        };
        if let Some(store) = store {
            match store.info().await {
                Ok(store_info) => info.backend.store = Some(store_info),
                Err(err) => debug!(error = %err, "Backend info unavailable"),
            }
        }
        info
    }

    /// Re-normalizes stored text and recomputes vectors.
    ///
    /// See [`normalize::normalize_store`] for the per-entry rules.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotConnected`] when disconnected, or an error
    /// if a page cannot be listed.
    pub async fn normalize_data(
        &self,
        embedder: &dyn Embedder,
        config: &NormalizationConfig,
        batch_size: Option<usize>,
        force: bool,
    ) -> Result<NormalizeStats> {
        let store = self.store()?;
        let normalizer = BasicNormalizer::new(config.clone());
        let batch_size = batch_size.unwrap_or(self.config.normalize_batch_size);
        normalize::normalize_store(
            store.as_ref(),
            embedder,
            &normalizer,
            &config.text_fields,
            batch_size,
            force,
        )
        .await
    }
}

impl std::fmt::Debug for StoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("StoreManager")
            .field("requested", &self.config.store.backend)
            .field("state", &inner.state)
            .field("active", &inner.active_backend)
            .finish_non_exhaustive()
    }
}
