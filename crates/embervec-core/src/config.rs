//! `EmberVec` Configuration Module
//!
//! Provides configuration file support via `embervec.toml` and environment
//! variables.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`EMBERVEC_*`, `__` separates sections)
//! 2. Configuration file (`embervec.toml`)
//! 3. Default values
//!
//! ```text
//! EMBERVEC_STORE__DIMENSION=768
//! EMBERVEC_LOGGING__LEVEL=debug
//! ```

use crate::index::{Algorithm, IndexConfig, DEFAULT_CAPACITY, DEFAULT_MIN_DATASET_SIZE};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Backend name of the built-in in-memory store.
pub const MEMORY_BACKEND: &str = "memory";

/// Vector store section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Requested backend name.
    pub backend: String,
    /// Collection name, also the persistence sub-directory.
    pub collection: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Maximum number of points.
    pub capacity: usize,
    /// Search algorithm.
    pub algorithm: Algorithm,
    /// Below this many points every search is a linear scan.
    pub min_dataset_size: usize,
    /// Persist the collection under `data_dir`.
    pub persist: bool,
    /// Root directory for persisted collections.
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: MEMORY_BACKEND.to_string(),
            collection: "default".to_string(),
            dimension: 384,
            capacity: DEFAULT_CAPACITY,
            algorithm: Algorithm::Flat,
            min_dataset_size: DEFAULT_MIN_DATASET_SIZE,
            persist: false,
            data_dir: PathBuf::from("./embervec_data"),
        }
    }
}

impl StoreConfig {
    /// Creates a non-persistent memory configuration.
    #[must_use]
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            ..Self::default()
        }
    }

    /// Enables persistence under `data_dir`.
    #[must_use]
    pub fn with_persistence(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.persist = true;
        self.data_dir = data_dir.into();
        self
    }

    /// Directory of this collection, when persistence is enabled.
    #[must_use]
    pub fn collection_dir(&self) -> Option<PathBuf> {
        self.persist.then(|| self.data_dir.join(&self.collection))
    }

    /// Index configuration derived from this section.
    #[must_use]
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            algorithm: self.algorithm,
            dimension: self.dimension,
            capacity: self.capacity,
            min_dataset_size: self.min_dataset_size,
            persist_path: self.collection_dir(),
        }
    }
}

/// Store manager section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Upper bound for a backend disconnect, in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Page size of the normalization job.
    pub normalize_batch_size: usize,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: 5000,
            normalize_batch_size: 100,
        }
    }
}

/// Text normalization section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Lowercase the text.
    pub lowercase: bool,
    /// Collapse runs of whitespace into one space and trim the ends.
    pub collapse_whitespace: bool,
    /// Drop control characters.
    pub strip_control: bool,
    /// Truncate to this many characters.
    pub max_chars: Option<usize>,
    /// Payload fields searched, in order, for the text to normalize.
    pub text_fields: Vec<String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            lowercase: false,
            collapse_whitespace: true,
            strip_control: true,
            max_chars: None,
            text_fields: ["text", "content", "data", "memory"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `EmberVec` configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmberConfig {
    /// Vector store configuration.
    pub store: StoreConfig,
    /// Store manager configuration.
    pub manager: ManagerSettings,
    /// Text normalization configuration.
    pub normalization: NormalizationConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl EmberConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("embervec.toml")
    }

    /// Loads configuration from a specific file path. A missing file is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("EMBERVEC_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let store = &self.store;
        if store.backend.trim().is_empty() {
            return Err(invalid("store.backend", "must not be empty".to_string()));
        }

        if store.collection.is_empty()
            || store
                .collection
                .chars()
                .any(|c| matches!(c, '/' | '\\') || c.is_control())
            || store.collection == "."
            || store.collection == ".."
        {
            return Err(invalid(
                "store.collection",
                format!("'{}' is not a valid directory name", store.collection),
            ));
        }

        if store.dimension == 0 || store.dimension > 65536 {
            return Err(invalid(
                "store.dimension",
                format!("value {} is out of range [1, 65536]", store.dimension),
            ));
        }

        if store.capacity == 0 {
            return Err(invalid("store.capacity", "must be greater than 0".to_string()));
        }

        if self.manager.shutdown_timeout_ms == 0 {
            return Err(invalid(
                "manager.shutdown_timeout_ms",
                "must be greater than 0".to_string(),
            ));
        }

        if self.manager.normalize_batch_size == 0 {
            return Err(invalid(
                "manager.normalize_batch_size",
                "must be greater than 0".to_string(),
            ));
        }

        if self.normalization.text_fields.is_empty() {
            return Err(invalid(
                "normalization.text_fields",
                "must name at least one field".to_string(),
            ));
        }

        if self.normalization.max_chars == Some(0) {
            return Err(invalid(
                "normalization.max_chars",
                "must be greater than 0 when set".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging.level",
                format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid(
                "logging.format",
                format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            ));
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    }
}
