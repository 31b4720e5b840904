//! Approximate/exact vector index with linear-scan fallback.
//!
//! The index keeps every (id, vector) pair in a side mapping that is the
//! source of truth for linear scan and persistence. When the configured
//! provider is available, the same vectors are mirrored into an accelerated
//! index. Any failure of the accelerated index downgrades to linear scan and
//! is logged; it is never returned to the caller.
//!
//! # Search Policy
//!
//! `use_ann = ann_available && len >= min_dataset_size`, evaluated on every
//! call. Accelerated hits are re-scored with exact cosine similarity from the
//! side mapping, and their provider distance is reported alongside.

use super::params::{Algorithm, IndexConfig};
use super::persistence::{self, IndexMeta};
use super::provider::{AnnIndex, AnnProvider};
use super::stats::{IndexStats, SearchMetrics};
use crate::distance::{cosine_similarity, validate_dimension};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Over-fetch multiplier for filtered accelerated searches.
pub const ANN_OVERFETCH_FACTOR: usize = 4;

/// A scored id produced by [`VectorIndex::search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    /// Point id.
    pub id: u64,
    /// Cosine similarity to the query.
    pub score: f32,
    /// Provider distance when the accelerated path answered.
    pub distance: Option<f32>,
    /// Whether the accelerated path answered.
    pub from_ann: bool,
}

/// Vector index choosing between an accelerated index and linear scan.
///
/// # Example
///
/// ```rust
/// use embervec_core::index::{IndexConfig, ProviderRegistry, VectorIndex};
///
/// let config = IndexConfig::new(3).with_min_dataset_size(1);
/// let provider = ProviderRegistry::with_defaults().resolve(config.algorithm);
/// let mut index = VectorIndex::new(config, provider).unwrap();
/// index.initialize();
///
/// index.add_vectors(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]], &[1, 2]).unwrap();
/// let hits = index.search(&[1.0, 0.0, 0.0], 1, None).unwrap();
/// assert_eq!(hits[0].id, 1);
/// ```
pub struct VectorIndex {
    config: IndexConfig,
    provider: Arc<dyn AnnProvider>,
    /// Source of truth for linear scan and persistence.
    vectors: FxHashMap<u64, Vec<f32>>,
    /// Present only while `ann_available` is true.
    ann: Option<Box<dyn AnnIndex>>,
    ann_available: bool,
    initialized: bool,
    last_build: Option<Duration>,
    last_search: Mutex<Option<SearchMetrics>>,
}

impl VectorIndex {
    /// Creates an index. Call [`VectorIndex::initialize`] before use to build
    /// or load the accelerated index; until then searches are linear.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: IndexConfig, provider: Arc<dyn AnnProvider>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            vectors: FxHashMap::default(),
            ann: None,
            ann_available: false,
            initialized: false,
            last_build: None,
            last_search: Mutex::new(None),
        })
    }

    /// Loads persisted state if present, otherwise constructs a new
    /// accelerated index. Idempotent. Never fails: acceleration problems
    /// leave the index in linear-scan mode.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        if let Some(dir) = self.config.persist_path.clone() {
            if persistence::state_exists(&dir) {
                self.load(&dir);
                return;
            }
        }

        self.rebuild();
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Returns true if `id` is stored.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.vectors.contains_key(&id)
    }

    /// Iterates over stored ids in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.vectors.keys().copied()
    }

    /// Returns the stored vector for `id`.
    #[must_use]
    pub fn get_vector(&self, id: u64) -> Option<&[f32]> {
        self.vectors.get(&id).map(Vec::as_slice)
    }

    /// Whether an accelerated index is built and healthy.
    #[must_use]
    pub fn is_ann_available(&self) -> bool {
        self.ann_available
    }

    /// Whether the next search would take the accelerated path.
    #[must_use]
    pub fn uses_ann(&self) -> bool {
        self.ann_available && self.vectors.len() >= self.config.min_dataset_size
    }

    /// Adds vectors under caller-assigned ids, replacing existing ids.
    ///
    /// All inputs are validated before any mutation.
    ///
    /// # Errors
    ///
    /// - [`Error::LengthMismatch`] if `vectors` and `ids` differ in length
    /// - [`Error::DuplicateId`] if an id repeats within the batch
    /// - [`Error::DimensionMismatch`] if any vector has the wrong length
    /// - [`Error::CapacityExceeded`] if the batch would exceed capacity
    pub fn add_vectors(&mut self, vectors: &[Vec<f32>], ids: &[u64]) -> Result<()> {
        if vectors.len() != ids.len() {
            return Err(Error::LengthMismatch(format!(
                "{} vectors for {} ids",
                vectors.len(),
                ids.len()
            )));
        }
        let mut seen = FxHashSet::default();
        for id in ids {
            if !seen.insert(*id) {
                return Err(Error::DuplicateId(*id));
            }
        }
        for vector in vectors {
            validate_dimension(self.config.dimension, vector.len())?;
        }
        let replaced: Vec<u64> = ids.iter().copied().filter(|id| self.contains(*id)).collect();
        let requested = self.vectors.len() + ids.len() - replaced.len();
        if requested > self.config.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.config.capacity,
                requested,
            });
        }
        if ids.is_empty() {
            return Ok(());
        }

        if !replaced.is_empty() {
            self.ann_remove(&replaced);
        }
        for (vector, id) in vectors.iter().zip(ids) {
            self.vectors.insert(*id, vector.clone());
        }

        if let Some(ann) = self.ann.as_mut() {
            if let Err(e) = ann.add_with_ids(vectors, ids) {
                warn!(error = %e, count = ids.len(), "Accelerated index rejected vectors, switching to linear scan");
                self.disable_ann();
            }
        }
        Ok(())
    }

    /// Removes ids, returning how many were stored.
    pub fn remove_vectors(&mut self, ids: &[u64]) -> usize {
        let removed: Vec<u64> = ids
            .iter()
            .copied()
            .filter(|id| self.vectors.remove(id).is_some())
            .collect();
        if !removed.is_empty() {
            self.ann_remove(&removed);
        }
        removed.len()
    }

    /// Returns up to `k` hits ordered by descending score.
    ///
    /// `predicate` restricts the result to accepted ids. On the accelerated
    /// path the index over-fetches [`ANN_OVERFETCH_FACTOR`]` * k` candidates
    /// (capped at the stored count) before filtering. A failing accelerated
    /// search degrades this call to linear scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the query has the wrong length.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        predicate: Option<&dyn Fn(u64) -> bool>,
    ) -> Result<Vec<IndexHit>> {
        validate_dimension(self.config.dimension, query.len())?;
        let start = Instant::now();

        let mut degraded = false;
        let mut hits = None;
        if k > 0 && self.uses_ann() {
            match self.search_ann(query, k, predicate) {
                Ok(found) => hits = Some(found),
                Err(e) => {
                    warn!(error = %e, "Accelerated search failed, falling back to linear scan");
                    degraded = true;
                }
            }
        }
        let from_ann = hits.is_some();
        let hits = match hits {
            Some(found) => found,
            None => self.search_linear(query, k, predicate),
        };

        let metrics = SearchMetrics {
            duration: start.elapsed(),
            result_count: hits.len(),
            from_ann,
            degraded,
        };
        debug!(
            k,
            results = hits.len(),
            from_ann,
            degraded,
            elapsed_us = metrics.duration.as_micros() as u64,
            "Vector search"
        );
        *self.last_search.lock() = Some(metrics);
        Ok(hits)
    }

    fn search_ann(
        &self,
        query: &[f32],
        k: usize,
        predicate: Option<&dyn Fn(u64) -> bool>,
    ) -> Result<Vec<IndexHit>> {
        let ann = self
            .ann
            .as_ref()
            .ok_or_else(|| Error::AnnUnavailable("no accelerated index built".to_string()))?;

        let fetch = if predicate.is_some() {
            k.saturating_mul(ANN_OVERFETCH_FACTOR)
        } else {
            k
        }
        .min(self.vectors.len());

        let raw = ann.search(query, fetch)?;
        let mut hits: Vec<IndexHit> = raw
            .ids
            .iter()
            .zip(&raw.distances)
            .filter(|(id, _)| predicate.is_none_or(|accept| accept(**id)))
            .filter_map(|(id, distance)| {
                self.vectors.get(id).map(|stored| IndexHit {
                    id: *id,
                    score: cosine_similarity(query, stored),
                    distance: Some(*distance),
                    from_ann: true,
                })
            })
            .collect();

        hits.sort_by(descending);
        hits.truncate(k);
        Ok(hits)
    }

    fn search_linear(
        &self,
        query: &[f32],
        k: usize,
        predicate: Option<&dyn Fn(u64) -> bool>,
    ) -> Vec<IndexHit> {
        if k == 0 {
            return Vec::new();
        }

        let mut hits: Vec<IndexHit> = self
            .vectors
            .iter()
            .filter(|(id, _)| predicate.is_none_or(|accept| accept(**id)))
            .map(|(id, stored)| IndexHit {
                id: *id,
                score: cosine_similarity(query, stored),
                distance: None,
                from_ann: false,
            })
            .collect();

        if hits.len() > k {
            hits.select_nth_unstable_by(k, descending);
            hits.truncate(k);
        }
        hits.sort_by(descending);
        hits
    }

    /// Removes every vector, keeping the accelerated index (if any) alive.
    pub fn clear(&mut self) {
        self.vectors.clear();
        if let Some(ann) = self.ann.as_mut() {
            if let Err(e) = ann.reset() {
                warn!(error = %e, "Failed to reset accelerated index, switching to linear scan");
                self.disable_ann();
            }
        }
    }

    /// Rebuilds the accelerated index from the side mapping.
    ///
    /// Returns whether acceleration is available afterwards. Also the way to
    /// re-enable acceleration after an earlier failure.
    pub fn rebuild(&mut self) -> bool {
        self.rebuild_excluding(&[])
    }

    fn rebuild_excluding(&mut self, excluded: &[u64]) -> bool {
        if !self.provider.is_available() {
            if self.config.algorithm == Algorithm::Flat {
                warn!(
                    provider = self.provider.name(),
                    "Accelerated index provider unavailable, using linear scan"
                );
            }
            self.disable_ann();
            return false;
        }

        let start = Instant::now();
        let (ids, vectors): (Vec<u64>, Vec<Vec<f32>>) = self
            .vectors
            .iter()
            .filter(|(id, _)| !excluded.contains(*id))
            .map(|(id, v)| (*id, v.clone()))
            .unzip();

        let built = self.provider.create_flat(self.config.dimension).and_then(|mut ann| {
            if !ids.is_empty() {
                ann.add_with_ids(&vectors, &ids)?;
            }
            Ok(ann)
        });

        match built {
            Ok(ann) => {
                let elapsed = start.elapsed();
                debug!(count = ids.len(), elapsed_ms = elapsed.as_millis() as u64, "Built accelerated index");
                self.ann = Some(ann);
                self.ann_available = true;
                self.last_build = Some(elapsed);
                true
            }
            Err(e) => {
                warn!(error = %e, provider = self.provider.name(), "Failed to build accelerated index, using linear scan");
                self.disable_ann();
                false
            }
        }
    }

    /// Removes ids from the accelerated index, rebuilding when the provider
    /// cannot delete individual entries.
    fn ann_remove(&mut self, ids: &[u64]) {
        let Some(ann) = self.ann.as_mut() else {
            return;
        };
        if ann.supports_remove() {
            if let Err(e) = ann.remove_ids(ids) {
                warn!(error = %e, "Accelerated index removal failed, switching to linear scan");
                self.disable_ann();
            }
        } else {
            self.rebuild_excluding(ids);
        }
    }

    fn disable_ann(&mut self) {
        self.ann = None;
        self.ann_available = false;
    }

    /// Writes the index under `dir` (see [`persistence`] for the layout).
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let ann_fingerprint = match self.ann.as_ref() {
            Some(ann) => {
                let temp = dir.join(format!("{}.tmp", persistence::ANN_FILE));
                ann.write_index(&temp)?;
                let fingerprint = persistence::fingerprint(&temp)?;
                std::fs::rename(&temp, persistence::ann_path(dir))?;
                Some(fingerprint)
            }
            None => {
                persistence::write_placeholder(dir)?;
                None
            }
        };

        let vectors = self.vectors.iter().map(|(id, v)| (*id, v.clone())).collect();
        let meta = IndexMeta::new(
            self.config.dimension,
            self.config.algorithm,
            ann_fingerprint,
            vectors,
        );
        persistence::write_meta(dir, &meta)
    }

    /// Replaces the index content with the state persisted under `dir`.
    ///
    /// Missing or corrupt metadata leaves the index empty in linear-scan
    /// mode. A missing, unreadable or mismatched snapshot next to valid
    /// metadata is rebuilt from the stored vectors. Returns true if state was
    /// restored.
    pub fn load(&mut self, dir: &Path) -> bool {
        self.initialized = true;

        let meta = match persistence::read_meta(dir).and_then(|meta| {
            meta.validate(self.config.dimension)?;
            Ok(meta)
        }) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(error = %e, path = %dir.display(), "Could not load persisted index, starting empty in linear-scan mode");
                self.vectors.clear();
                self.disable_ann();
                return false;
            }
        };

        if meta.algorithm != self.config.algorithm {
            info!(
                persisted = %meta.algorithm,
                configured = %self.config.algorithm,
                "Persisted index algorithm differs from configuration"
            );
        }

        self.vectors = meta.vectors.into_iter().collect();
        self.disable_ann();

        if meta.ann {
            match self.read_snapshot(dir, meta.ann_fingerprint) {
                Ok(ann) => {
                    self.ann = Some(ann);
                    self.ann_available = true;
                }
                Err(e) => {
                    warn!(error = %e, "Accelerated snapshot unusable, rebuilding");
                    self.rebuild();
                }
            }
        }

        info!(
            count = self.vectors.len(),
            ann = self.ann_available,
            path = %dir.display(),
            "Loaded persisted index"
        );
        true
    }

    /// Reads the snapshot under `dir` if it is the one the metadata was
    /// written with and holds every stored vector.
    fn read_snapshot(&self, dir: &Path, expected: Option<u64>) -> Result<Box<dyn AnnIndex>> {
        let path = persistence::ann_path(dir);
        if expected != Some(persistence::fingerprint(&path)?) {
            return Err(Error::Ann(
                "snapshot does not match the index metadata".to_string(),
            ));
        }
        let ann = self.provider.read_index(&path, self.config.dimension)?;
        if ann.len() != self.vectors.len() {
            return Err(Error::Ann(format!(
                "snapshot holds {} vectors, metadata {}",
                ann.len(),
                self.vectors.len()
            )));
        }
        Ok(ann)
    }

    /// Returns a stats snapshot.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            vector_count: self.vectors.len(),
            ann_active: self.uses_ann(),
            ann_available: self.ann_available,
            algorithm: self.config.algorithm,
            provider: self.provider.name().to_string(),
            min_dataset_size: self.config.min_dataset_size,
            last_build: self.last_build,
            last_search: *self.last_search.lock(),
        }
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .field("len", &self.vectors.len())
            .field("ann_available", &self.ann_available)
            .finish_non_exhaustive()
    }
}

fn descending(a: &IndexHit, b: &IndexHit) -> Ordering {
    b.score.total_cmp(&a.score)
}
