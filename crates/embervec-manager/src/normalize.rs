//! Text normalization job.
//!
//! Walks a store page by page, normalizes the text held in each payload,
//! recomputes the vector from the normalized text and writes both back.
//! Entries already marked `"normalized": true` are skipped unless forced.

use crate::backend::VectorStore;
use crate::error::{ManagerError, Result};
use async_trait::async_trait;
use embervec_core::{NormalizationConfig, Payload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Payload key marking an entry as normalized.
pub const NORMALIZED_KEY: &str = "normalized";

/// Turns text into a vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `text`.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Canonicalizes text before embedding.
pub trait TextNormalizer: Send + Sync {
    /// Returns the normalized form of `text`.
    fn normalize(&self, text: &str) -> String;
}

/// [`TextNormalizer`] driven by a [`NormalizationConfig`].
#[derive(Debug, Clone, Default)]
pub struct BasicNormalizer {
    config: NormalizationConfig,
}

impl BasicNormalizer {
    /// Creates a normalizer.
    #[must_use]
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }
}

impl TextNormalizer for BasicNormalizer {
    fn normalize(&self, text: &str) -> String {
        let mut out: String = if self.config.strip_control {
            text.chars()
                .filter(|c| !c.is_control() || c.is_whitespace())
                .collect()
        } else {
            text.to_string()
        };
        if self.config.collapse_whitespace {
            out = out.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        if self.config.lowercase {
            out = out.to_lowercase();
        }
        if let Some(max) = self.config.max_chars {
            if let Some((cut, _)) = out.char_indices().nth(max) {
                out.truncate(cut);
            }
        }
        out
    }
}

/// Outcome of a normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    /// Entries re-embedded and written back.
    pub updated: usize,
    /// Entries already normalized, or without text.
    pub skipped: usize,
    /// Entries whose embedding or update failed.
    pub failed: usize,
}

impl NormalizeStats {
    /// Number of entries visited.
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated + self.skipped + self.failed
    }
}

/// Returns the first payload field among `fields` holding a non-empty string.
#[must_use]
pub fn extract_text<'a>(payload: &'a Payload, fields: &'a [String]) -> Option<(&'a str, &'a str)> {
    fields.iter().find_map(|field| match payload.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some((field.as_str(), text.as_str())),
        _ => None,
    })
}

fn is_normalized(payload: &Payload) -> bool {
    payload.get(NORMALIZED_KEY) == Some(&Value::Bool(true))
}

async fn embed(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(text)
        .await
        .map_err(|e| ManagerError::Embedding(e.to_string()))
}

/// Normalizes every entry of `store`.
///
/// Pages through `list(None, batch_size, offset)`; each page is fully
/// written before the next is fetched, so an interrupted run leaves earlier
/// pages done. Per entry:
///
/// - `"normalized": true` and not `force`: skipped
/// - no non-empty string in `text_fields`: skipped
/// - otherwise the normalized text replaces the source field, the marker is
///   set, the vector is recomputed and the entry is updated
///
/// Embedding and update failures are counted and the run continues.
///
/// # Errors
///
/// Returns an error if `batch_size` is zero or a page cannot be listed.
pub async fn normalize_store(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    normalizer: &dyn TextNormalizer,
    text_fields: &[String],
    batch_size: usize,
    force: bool,
) -> Result<NormalizeStats> {
    if batch_size == 0 {
        return Err(ManagerError::backend(
            store.backend_type(),
            "normalization batch size must be greater than 0",
        ));
    }

    let mut stats = NormalizeStats::default();
    let mut offset = 0;
    loop {
        let page = store.list(None, batch_size, offset).await?;
        if page.records.is_empty() {
            break;
        }
        offset += page.records.len();

        for record in page.records {
            if !force && is_normalized(&record.payload) {
                stats.skipped += 1;
                continue;
            }
            let Some((field, text)) = extract_text(&record.payload, text_fields) else {
                stats.skipped += 1;
                continue;
            };
            let field = field.to_string();
            let normalized = normalizer.normalize(text);

            let vector = match embed(embedder, &normalized).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(id = record.id, error = %e, "Normalization embedding failed");
                    stats.failed += 1;
                    continue;
                }
            };

            let mut payload = record.payload;
            payload.insert(field, Value::String(normalized));
            payload.insert(NORMALIZED_KEY.to_string(), Value::Bool(true));
            match store.update(record.id, vector, payload).await {
                Ok(()) => stats.updated += 1,
                Err(e) => {
                    warn!(id = record.id, error = %e, "Normalization update failed");
                    stats.failed += 1;
                }
            }
        }
        debug!(offset, total = page.total, "Normalization batch committed");

        if offset >= page.total {
            break;
        }
    }

    info!(
        updated = stats.updated,
        skipped = stats.skipped,
        failed = stats.failed,
        "Normalization finished"
    );
    Ok(stats)
}
