//! # `EmberVec` Core
//!
//! Embeddable vector store engine: cosine similarity search over
//! caller-identified vectors with JSON payloads and metadata filters.
//!
//! ## Features
//!
//! - **Two search paths**: an accelerated index once a collection is large
//!   enough, exact linear scan otherwise or whenever acceleration fails
//! - **Pluggable providers**: accelerated indexes are resolved through an
//!   explicit [`ProviderRegistry`]
//! - **Metadata filters**: equality, numeric ranges and set membership with
//!   dot notation for nested fields
//! - **Persistence**: mutation log plus atomic checkpoints, restored on connect
//!
//! ## Quick Start
//!
//! ```rust
//! use embervec_core::{Filter, MemoryStore, ProviderRegistry, StoreConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new(
//!     StoreConfig::new("documents", 3),
//!     Arc::new(ProviderRegistry::with_defaults()),
//! );
//! store.connect()?;
//!
//! let payload = |tag: &str| json!({ "tag": tag }).as_object().cloned().unwrap_or_default();
//! store.insert(
//!     &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
//!     &[1, 2],
//!     vec![payload("a"), payload("b")],
//! )?;
//!
//! let filter = Filter::from_json(&json!({ "tag": "a" }))?;
//! let results = store.search(&[1.0, 0.1, 0.0], 5, Some(&filter))?;
//! assert_eq!(results[0].id, 1);
//! # Ok::<(), embervec_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_pass_by_value)]

pub mod config;
#[cfg(test)]
mod config_tests;
pub mod distance;
pub mod error;
pub mod filter;
pub mod index;
pub mod point;
pub mod store;
pub mod util;

pub use config::{
    ConfigError, EmberConfig, LoggingConfig, ManagerSettings, NormalizationConfig, StoreConfig,
    MEMORY_BACKEND,
};
pub use error::{Error, Result};
pub use filter::{Comparison, Condition, Filter};
pub use index::{
    Algorithm, AnnHits, AnnIndex, AnnProvider, IndexConfig, IndexStats, ProviderRegistry,
    SearchMetrics, VectorIndex,
};
pub use point::{ListPage, Payload, Point, SearchResult};
pub use store::{MemoryStore, StoreInfo};
