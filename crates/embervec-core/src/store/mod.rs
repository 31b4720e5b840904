//! Vector store backends.
//!
//! [`MemoryStore`] keeps one collection in memory and, when configured,
//! mirrors it to disk:
//!
//! ```text
//! <data_dir>/<collection>/
//! ├── index.ann
//! ├── index.meta.json
//! ├── payloads.json
//! └── collection.wal     # mutations since the last checkpoint
//! ```

mod memory;
mod payloads;
mod wal;

#[cfg(test)]
mod memory_tests;
#[cfg(test)]
mod wal_tests;

pub use memory::{MemoryStore, StoreInfo};
