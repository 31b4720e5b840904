//! Built-in flat accelerated index.
//!
//! Rows are stored unit-normalized in one contiguous buffer, so a query is a
//! single SIMD pass of squared L2 distances, which rank identically to cosine
//! similarity. Removal is a true per-id swap-remove.
//!
//! # Snapshot Layout
//!
//! ```text
//! magic "EMBERFLT" | bincode(FlatSnapshot { version, dimension, ids, data })
//! ```

use super::provider::{AnnHits, AnnIndex, AnnProvider};
use crate::distance::{normalized, squared_l2};
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const SNAPSHOT_MAGIC: &[u8; 8] = b"EMBERFLT";
const SNAPSHOT_VERSION: u32 = 1;

/// Provider for [`FlatIndex`]. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatProvider;

impl AnnProvider for FlatProvider {
    fn name(&self) -> &str {
        "flat"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_flat(&self, dimension: usize) -> Result<Box<dyn AnnIndex>> {
        if dimension == 0 {
            return Err(Error::InvalidDimension(dimension));
        }
        Ok(Box::new(FlatIndex::new(dimension)))
    }

    fn read_index(&self, path: &Path, dimension: usize) -> Result<Box<dyn AnnIndex>> {
        let index = FlatIndex::read(path)?;
        if index.dimension != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: index.dimension,
            });
        }
        Ok(Box::new(index))
    }
}

#[derive(Serialize, Deserialize)]
struct FlatSnapshot {
    version: u32,
    dimension: usize,
    ids: Vec<u64>,
    data: Vec<f32>,
}

/// Exact flat index over unit-normalized rows.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    /// Row owner ids; row `i` lives at `data[i * dimension..(i + 1) * dimension]`.
    ids: Vec<u64>,
    data: Vec<f32>,
    positions: FxHashMap<u64, usize>,
}

impl FlatIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            data: Vec::new(),
            positions: FxHashMap::default(),
        }
    }

    fn row(&self, pos: usize) -> &[f32] {
        &self.data[pos * self.dimension..(pos + 1) * self.dimension]
    }

    fn remove_one(&mut self, id: u64) -> bool {
        let Some(pos) = self.positions.remove(&id) else {
            return false;
        };
        let last = self.ids.len() - 1;
        if pos != last {
            let moved_id = self.ids[last];
            let dim = self.dimension;
            self.data.copy_within(last * dim..(last + 1) * dim, pos * dim);
            self.ids[pos] = moved_id;
            self.positions.insert(moved_id, pos);
        }
        self.ids.pop();
        self.data.truncate(last * self.dimension);
        true
    }

    fn read(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(Error::Ann(format!(
                "{} is not a flat index snapshot",
                path.display()
            )));
        }

        let snapshot: FlatSnapshot = bincode::deserialize_from(reader)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Ann(format!(
                "unsupported flat snapshot version {}",
                snapshot.version
            )));
        }
        if snapshot.dimension == 0 || snapshot.data.len() != snapshot.ids.len() * snapshot.dimension
        {
            return Err(Error::Ann("flat snapshot rows are truncated".to_string()));
        }

        let mut positions = FxHashMap::default();
        for (pos, id) in snapshot.ids.iter().enumerate() {
            if positions.insert(*id, pos).is_some() {
                return Err(Error::Ann(format!("flat snapshot repeats id {id}")));
            }
        }

        Ok(Self {
            dimension: snapshot.dimension,
            ids: snapshot.ids,
            data: snapshot.data,
            positions,
        })
    }
}

impl AnnIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn add_with_ids(&mut self, vectors: &[Vec<f32>], ids: &[u64]) -> Result<()> {
        if vectors.len() != ids.len() {
            return Err(Error::LengthMismatch(format!(
                "{} vectors for {} ids",
                vectors.len(),
                ids.len()
            )));
        }
        for (vector, id) in vectors.iter().zip(ids) {
            if vector.len() != self.dimension {
                return Err(Error::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
            if self.positions.contains_key(id) {
                return Err(Error::Ann(format!("id {id} is already indexed")));
            }
        }

        self.data.reserve(vectors.len() * self.dimension);
        for (vector, id) in vectors.iter().zip(ids) {
            self.positions.insert(*id, self.ids.len());
            self.ids.push(*id);
            self.data.extend_from_slice(&normalized(vector));
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<AnnHits> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let k = k.min(self.ids.len());
        if k == 0 {
            return Ok(AnnHits::default());
        }

        let query = normalized(query);
        let mut scored: Vec<(u64, f32)> = (0..self.ids.len())
            .map(|pos| (self.ids[pos], squared_l2(&query, self.row(pos))))
            .collect();

        let ascending = |a: &(u64, f32), b: &(u64, f32)| a.1.total_cmp(&b.1);
        if scored.len() > k {
            scored.select_nth_unstable_by(k, ascending);
            scored.truncate(k);
        }
        scored.sort_by(ascending);

        let (ids, distances) = scored.into_iter().unzip();
        Ok(AnnHits { ids, distances })
    }

    fn remove_ids(&mut self, ids: &[u64]) -> Result<usize> {
        Ok(ids.iter().filter(|id| self.remove_one(**id)).count())
    }

    fn reset(&mut self) -> Result<()> {
        self.ids.clear();
        self.data.clear();
        self.positions.clear();
        Ok(())
    }

    fn write_index(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(SNAPSHOT_MAGIC)?;
        let snapshot = FlatSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            ids: self.ids.clone(),
            data: self.data.clone(),
        };
        bincode::serialize_into(&mut writer, &snapshot)?;
        writer.flush()?;
        Ok(())
    }
}
