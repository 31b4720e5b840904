//! Provider doubles used by the index tests.

use super::flat::FlatIndex;
use super::provider::{AnnHits, AnnIndex, AnnProvider};
use crate::error::{Error, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Claims to be available but fails every construction.
pub struct BrokenProvider;

impl AnnProvider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_flat(&self, _dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Err(Error::Ann("construction failed".to_string()))
    }

    fn read_index(&self, _path: &Path, _dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Err(Error::Ann("read failed".to_string()))
    }
}

/// Behaviour switches for [`WrappedIndex`].
#[derive(Clone, Copy, Default)]
pub struct Quirks {
    pub no_remove: bool,
    pub failing_search: bool,
    pub failing_add: bool,
}

/// Flat index wrapper with configurable quirks. Counts constructions.
#[derive(Clone, Default)]
pub struct QuirkyProvider {
    pub quirks: Quirks,
    pub builds: Arc<AtomicUsize>,
}

impl QuirkyProvider {
    pub fn new(quirks: Quirks) -> Self {
        Self {
            quirks,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl AnnProvider for QuirkyProvider {
    fn name(&self) -> &str {
        "quirky"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_flat(&self, dimension: usize) -> Result<Box<dyn AnnIndex>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(WrappedIndex {
            inner: FlatIndex::new(dimension),
            quirks: self.quirks,
        }))
    }

    fn read_index(&self, _path: &Path, _dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Err(Error::Ann("snapshots not supported".to_string()))
    }
}

pub struct WrappedIndex {
    inner: FlatIndex,
    quirks: Quirks,
}

impl AnnIndex for WrappedIndex {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn add_with_ids(&mut self, vectors: &[Vec<f32>], ids: &[u64]) -> Result<()> {
        if self.quirks.failing_add {
            return Err(Error::Ann("add failed".to_string()));
        }
        self.inner.add_with_ids(vectors, ids)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<AnnHits> {
        if self.quirks.failing_search {
            return Err(Error::Ann("search failed".to_string()));
        }
        self.inner.search(query, k)
    }

    fn supports_remove(&self) -> bool {
        !self.quirks.no_remove
    }

    fn remove_ids(&mut self, ids: &[u64]) -> Result<usize> {
        if self.quirks.no_remove {
            return Err(Error::Ann("removal not supported".to_string()));
        }
        self.inner.remove_ids(ids)
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }

    fn write_index(&self, path: &Path) -> Result<()> {
        self.inner.write_index(path)
    }
}
