//! On-disk layout of a persisted index.
//!
//! # File Layout
//!
//! ```text
//! <dir>/
//! ├── index.ann        # accelerated index snapshot, or the placeholder marker
//! └── index.meta.json  # dimension, algorithm, count, full id -> vector mapping
//! ```
//!
//! The snapshot file always exists after a save so that its absence can be
//! told apart from "saved without an accelerated index". The metadata records
//! a fingerprint of the snapshot bytes; a snapshot that does not match it
//! (a crash between the two renames) is never trusted.

use super::params::Algorithm;
use crate::error::{Error, Result};
use crate::util::write_atomic;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

pub(crate) const ANN_FILE: &str = "index.ann";
pub(crate) const META_FILE: &str = "index.meta.json";

/// Content of the snapshot file when no accelerated index existed.
pub(crate) const PLACEHOLDER: &[u8] = b"EMBERVEC:NO-ANN\n";

const META_VERSION: u32 = 1;

/// Metadata persisted next to the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct IndexMeta {
    pub version: u32,
    pub dimension: usize,
    pub algorithm: Algorithm,
    pub count: usize,
    /// Whether `index.ann` holds a real snapshot.
    pub ann: bool,
    /// Fingerprint of the `index.ann` bytes written with this metadata.
    #[serde(default)]
    pub ann_fingerprint: Option<u64>,
    pub vectors: BTreeMap<u64, Vec<f32>>,
}

impl IndexMeta {
    pub fn new(
        dimension: usize,
        algorithm: Algorithm,
        ann_fingerprint: Option<u64>,
        vectors: BTreeMap<u64, Vec<f32>>,
    ) -> Self {
        Self {
            version: META_VERSION,
            dimension,
            algorithm,
            count: vectors.len(),
            ann: ann_fingerprint.is_some(),
            ann_fingerprint,
            vectors,
        }
    }

    /// Checks internal consistency against the expected dimension.
    pub fn validate(&self, dimension: usize) -> Result<()> {
        if self.version != META_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported index metadata version {}",
                self.version
            )));
        }
        if self.dimension != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: self.dimension,
            });
        }
        if self.count != self.vectors.len() {
            return Err(Error::Serialization(format!(
                "index metadata count {} disagrees with {} stored vectors",
                self.count,
                self.vectors.len()
            )));
        }
        if let Some((id, v)) = self.vectors.iter().find(|(_, v)| v.len() != dimension) {
            return Err(Error::Serialization(format!(
                "vector {id} has length {}, expected {dimension}",
                v.len()
            )));
        }
        Ok(())
    }
}

pub(crate) fn ann_path(dir: &Path) -> PathBuf {
    dir.join(ANN_FILE)
}

pub(crate) fn meta_path(dir: &Path) -> PathBuf {
    dir.join(META_FILE)
}

/// Returns true if a metadata file exists in `dir`.
pub(crate) fn state_exists(dir: &Path) -> bool {
    meta_path(dir).exists()
}

pub(crate) fn write_meta(dir: &Path, meta: &IndexMeta) -> Result<()> {
    let data = serde_json::to_vec(meta)?;
    write_atomic(&meta_path(dir), &data)?;
    Ok(())
}

pub(crate) fn read_meta(dir: &Path) -> Result<IndexMeta> {
    let data = std::fs::read(meta_path(dir))?;
    Ok(serde_json::from_slice(&data)?)
}

pub(crate) fn write_placeholder(dir: &Path) -> Result<()> {
    write_atomic(&ann_path(dir), PLACEHOLDER)?;
    Ok(())
}

/// Hashes the content of a snapshot file.
pub(crate) fn fingerprint(path: &Path) -> Result<u64> {
    let data = std::fs::read(path)?;
    let mut hasher = FxHasher::default();
    hasher.write_usize(data.len());
    hasher.write(&data);
    Ok(hasher.finish())
}
