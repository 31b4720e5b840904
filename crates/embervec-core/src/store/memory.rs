//! In-memory vector store with optional write-through persistence.

use super::payloads;
use super::wal::{self, Wal, WalEntry, WalRecord};
use crate::config::StoreConfig;
use crate::distance::validate_dimension;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::index::{Algorithm, IndexStats, ProviderRegistry, VectorIndex};
use crate::point::{ListPage, Payload, Point, SearchResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of a connected store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Collection name.
    pub collection: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Number of stored points.
    pub count: usize,
    /// Maximum number of points.
    pub capacity: usize,
    /// Configured algorithm.
    pub algorithm: Algorithm,
    /// Whether the next search would use the accelerated path.
    pub ann_active: bool,
    /// Whether an accelerated index is built and healthy.
    pub ann_available: bool,
    /// Collection directory, when persistence is enabled.
    pub persist_path: Option<PathBuf>,
}

/// What a successful mutation leaves on disk.
enum WriteThrough {
    Nothing,
    /// Log the current version of these points.
    Upsert(Vec<u64>),
    Delete(Vec<u64>),
    /// Write the full state and drop the log.
    Checkpoint,
}

/// State that exists only while connected.
struct Collection {
    index: VectorIndex,
    /// Every stored id has an entry, possibly empty. Ordered for listing.
    payloads: BTreeMap<u64, Payload>,
    /// Opened on first append; dropped after a failed one.
    wal: Option<Wal>,
}

impl Collection {
    /// Writes the full state under `dir`, then removes the log it covers.
    fn checkpoint(&mut self, dir: &Path) -> Result<()> {
        self.index.save(dir)?;
        payloads::write(dir, &self.payloads)?;
        self.wal = None;
        wal::remove(dir)
    }

    fn write_through(&mut self, dir: &Path, through: WriteThrough) -> Result<()> {
        let entry = match through {
            WriteThrough::Nothing => return Ok(()),
            WriteThrough::Checkpoint => return self.checkpoint(dir),
            WriteThrough::Upsert(ids) => WalEntry::Upsert {
                points: ids
                    .iter()
                    .filter_map(|id| self.record(*id))
                    .map(WalRecord::from)
                    .collect(),
            },
            WriteThrough::Delete(ids) => WalEntry::Delete { ids },
        };

        if self.wal.is_none() {
            self.wal = Some(Wal::open(dir)?);
        }
        let result = match self.wal.as_mut() {
            Some(log) => log.append(&entry),
            None => Ok(()),
        };
        if result.is_err() {
            self.wal = None;
        }
        result
    }

    /// Applies the log under `dir` on top of the loaded state and returns
    /// the number of entries it held.
    fn replay(&mut self, dir: &Path) -> usize {
        let entries = match wal::read(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, path = %dir.display(), "Could not read mutation log");
                return 0;
            }
        };
        for entry in &entries {
            if let Err(e) = self.apply(entry) {
                warn!(error = %e, "Skipping log entry that no longer applies");
            }
        }
        if !entries.is_empty() {
            info!(entries = entries.len(), count = self.index.len(), "Replayed mutation log");
        }
        entries.len()
    }

    fn apply(&mut self, entry: &WalEntry) -> Result<()> {
        match entry {
            WalEntry::Upsert { points } => {
                let ids: Vec<u64> = points.iter().map(|p| p.id).collect();
                let vectors: Vec<Vec<f32>> = points.iter().map(|p| p.vector.clone()).collect();
                self.index.add_vectors(&vectors, &ids)?;
                for point in points {
                    self.payloads.insert(point.id, point.payload.clone());
                }
            }
            WalEntry::Delete { ids } => {
                self.index.remove_vectors(ids);
                for id in ids {
                    self.payloads.remove(id);
                }
            }
        }
        Ok(())
    }

    fn record(&self, id: u64) -> Option<Point> {
        let vector = self.index.get_vector(id)?;
        let payload = self.payloads.get(&id).cloned().unwrap_or_default();
        Some(Point::new(id, vector.to_vec(), payload))
    }
}

/// In-memory store for one collection.
///
/// Points live in a [`VectorIndex`] plus an ordered id -> payload map. With
/// persistence enabled every mutation is appended to the collection's
/// mutation log under `<data_dir>/<collection>/`, and the full state is
/// checkpointed on [`flush`](Self::flush), [`disconnect`](Self::disconnect)
/// and [`delete_collection`](Self::delete_collection). Write failures are
/// logged and never undo the in-memory change.
///
/// # Example
///
/// ```rust
/// use embervec_core::{Filter, MemoryStore, ProviderRegistry, StoreConfig};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let store = MemoryStore::new(
///     StoreConfig::new("docs", 2),
///     Arc::new(ProviderRegistry::with_defaults()),
/// );
/// store.connect().unwrap();
///
/// let payload = json!({"tag": "a"}).as_object().cloned().unwrap();
/// store.insert(&[vec![1.0, 0.0]], &[1], vec![payload]).unwrap();
///
/// let filter = Filter::from_json(&json!({"tag": "a"})).unwrap();
/// let hits = store.search(&[1.0, 0.0], 5, Some(&filter)).unwrap();
/// assert_eq!(hits[0].id, 1);
/// ```
pub struct MemoryStore {
    config: StoreConfig,
    providers: Arc<ProviderRegistry>,
    state: RwLock<Option<Collection>>,
}

impl MemoryStore {
    /// Creates a disconnected store.
    #[must_use]
    pub fn new(config: StoreConfig, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            config,
            providers,
            state: RwLock::new(None),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns true while connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.read().is_some()
    }

    /// Builds the index and loads persisted state if present. Idempotent.
    ///
    /// A missing or corrupt `payloads.json` starts with empty payloads. Logged
    /// mutations are replayed and then folded into a fresh checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn connect(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.is_some() {
            return Ok(());
        }

        let index_config = self.config.index_config();
        let provider = self.providers.resolve(index_config.algorithm);
        let mut index = VectorIndex::new(index_config, provider)?;
        index.initialize();

        let mut payloads = match self.config.collection_dir() {
            Some(dir) if payloads::payloads_path(&dir).exists() => {
                payloads::read(&dir).unwrap_or_else(|e| {
                    warn!(error = %e, path = %dir.display(), "Could not load payloads, starting without them");
                    BTreeMap::new()
                })
            }
            _ => BTreeMap::new(),
        };
        payloads.retain(|id, _| index.contains(*id));
        for id in missing_payloads(&index, &payloads) {
            payloads.insert(id, Payload::new());
        }

        let mut collection = Collection {
            index,
            payloads,
            wal: None,
        };
        if let Some(dir) = self.config.collection_dir() {
            if collection.replay(&dir) > 0 {
                if let Err(e) = collection.checkpoint(&dir) {
                    warn!(error = %e, path = %dir.display(), "Could not checkpoint replayed log");
                }
            }
        }

        info!(
            collection = %self.config.collection,
            count = collection.index.len(),
            ann = collection.index.is_ann_available(),
            persist = self.config.persist,
            "Vector store connected"
        );
        *state = Some(collection);
        Ok(())
    }

    /// Flushes persisted state and drops the collection. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails; the store is disconnected
    /// regardless.
    pub fn disconnect(&self) -> Result<()> {
        let Some(mut collection) = self.state.write().take() else {
            return Ok(());
        };
        let result = match self.config.collection_dir() {
            Some(dir) => collection.checkpoint(&dir),
            None => Ok(()),
        };
        info!(collection = %self.config.collection, "Vector store disconnected");
        result
    }

    /// Inserts points. Existing ids are replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected, the three inputs differ
    /// in length, or the index rejects the batch. Nothing is stored on error.
    pub fn insert(&self, vectors: &[Vec<f32>], ids: &[u64], payloads: Vec<Payload>) -> Result<()> {
        if payloads.len() != ids.len() {
            return Err(Error::LengthMismatch(format!(
                "{} payloads for {} ids",
                payloads.len(),
                ids.len()
            )));
        }
        self.write(|collection| {
            collection.index.add_vectors(vectors, ids)?;
            for (id, payload) in ids.iter().zip(payloads) {
                collection.payloads.insert(*id, payload);
            }
            debug!(count = ids.len(), "Inserted points");
            Ok(((), WriteThrough::Upsert(ids.to_vec())))
        })
    }

    /// Returns up to `limit` results by descending score, restricted to
    /// points whose payload matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected or the query has the
    /// wrong dimension.
    pub fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<SearchResult>> {
        self.read(|collection| {
            let accept = |id: u64| {
                filter.is_none_or(|f| collection.payloads.get(&id).is_some_and(|p| f.matches(p)))
            };
            let predicate: Option<&dyn Fn(u64) -> bool> = if filter.is_some() {
                Some(&accept)
            } else {
                None
            };
            let hits = collection.index.search(query, limit, predicate)?;

            Ok(hits
                .into_iter()
                .map(|hit| SearchResult {
                    id: hit.id,
                    score: hit.score,
                    payload: collection.payloads.get(&hit.id).cloned().unwrap_or_default(),
                    distance: hit.distance,
                    from_ann: hit.from_ann,
                })
                .collect())
        })
    }

    /// Returns the point stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn get(&self, id: u64) -> Result<Option<Point>> {
        self.read(|collection| Ok(collection.record(id)))
    }

    /// Replaces the vector and payload of an existing point.
    ///
    /// Readers observe either the old or the new point, never a gap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointNotFound`] if `id` is not stored, or a
    /// dimension error; the point is unchanged on error.
    pub fn update(&self, id: u64, vector: Vec<f32>, payload: Payload) -> Result<()> {
        validate_dimension(self.config.dimension, vector.len())?;
        self.write(|collection| {
            if !collection.index.contains(id) {
                return Err(Error::PointNotFound(id));
            }
            collection.index.remove_vectors(&[id]);
            collection.index.add_vectors(&[vector], &[id])?;
            collection.payloads.insert(id, payload);
            Ok(((), WriteThrough::Upsert(vec![id])))
        })
    }

    /// Deletes a point, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn delete(&self, id: u64) -> Result<bool> {
        self.write(|collection| {
            let removed = collection.index.remove_vectors(&[id]) > 0;
            collection.payloads.remove(&id);
            let through = if removed {
                WriteThrough::Delete(vec![id])
            } else {
                WriteThrough::Nothing
            };
            Ok((removed, through))
        })
    }

    /// Removes every point and persists the empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn delete_collection(&self) -> Result<()> {
        self.write(|collection| {
            let count = collection.index.len();
            collection.index.clear();
            collection.payloads.clear();
            info!(collection = %self.config.collection, count, "Collection cleared");
            Ok(((), WriteThrough::Checkpoint))
        })
    }

    /// Lists points in ascending id order.
    ///
    /// `total` counts every point matching `filter`, independent of `limit`
    /// and `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn list(&self, filter: Option<&Filter>, limit: usize, offset: usize) -> Result<ListPage> {
        self.read(|collection| {
            let mut total = 0;
            let mut records = Vec::new();
            for (id, payload) in &collection.payloads {
                if filter.is_some_and(|f| !f.matches(payload)) {
                    continue;
                }
                if total >= offset && records.len() < limit {
                    if let Some(record) = collection.record(*id) {
                        records.push(record);
                    }
                }
                total += 1;
            }
            Ok(ListPage { records, total })
        })
    }

    /// Number of stored points.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn count(&self) -> Result<usize> {
        self.read(|collection| Ok(collection.index.len()))
    }

    /// Returns a summary of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn info(&self) -> Result<StoreInfo> {
        self.read(|collection| {
            Ok(StoreInfo {
                collection: self.config.collection.clone(),
                dimension: self.config.dimension,
                count: collection.index.len(),
                capacity: self.config.capacity,
                algorithm: self.config.algorithm,
                ann_active: collection.index.uses_ann(),
                ann_available: collection.index.is_ann_available(),
                persist_path: self.config.collection_dir(),
            })
        })
    }

    /// Returns index statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn stats(&self) -> Result<IndexStats> {
        self.read(|collection| Ok(collection.index.stats()))
    }

    /// Rebuilds the accelerated index, returning whether it is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected.
    pub fn rebuild_index(&self) -> Result<bool> {
        self.write(|collection| Ok((collection.index.rebuild(), WriteThrough::Nothing)))
    }

    /// Checkpoints the current state to disk. No-op without persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is disconnected or a write fails.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        let collection = state.as_mut().ok_or_else(|| self.not_connected())?;
        match self.config.collection_dir() {
            Some(dir) => collection.checkpoint(&dir),
            None => Ok(()),
        }
    }

    fn not_connected(&self) -> Error {
        Error::NotConnected(self.config.collection.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&Collection) -> Result<T>) -> Result<T> {
        let state = self.state.read();
        let collection = state.as_ref().ok_or_else(|| self.not_connected())?;
        f(collection)
    }

    /// Runs a mutation and writes it through to disk on success.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collection) -> Result<(T, WriteThrough)>,
    ) -> Result<T> {
        let mut state = self.state.write();
        let collection = state.as_mut().ok_or_else(|| self.not_connected())?;
        let (value, through) = f(collection)?;
        if let Some(dir) = self.config.collection_dir() {
            if let Err(e) = collection.write_through(&dir, through) {
                warn!(error = %e, path = %dir.display(), "Write-through persistence failed");
            }
        }
        Ok(value)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collection", &self.config.collection)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Ids stored in the index but missing from `payloads`.
fn missing_payloads(index: &VectorIndex, payloads: &BTreeMap<u64, Payload>) -> Vec<u64> {
    index.ids().filter(|id| !payloads.contains_key(id)).collect()
}
