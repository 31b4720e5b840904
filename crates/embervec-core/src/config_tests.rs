//! Tests for config module

use crate::config::*;
use crate::index::Algorithm;
use serial_test::serial;
use std::path::PathBuf;

// ========================================================================
// Defaults
// ========================================================================

#[test]
fn test_config_default_values() {
    let config = EmberConfig::default();

    assert_eq!(config.store.backend, "memory");
    assert_eq!(config.store.collection, "default");
    assert_eq!(config.store.algorithm, Algorithm::Flat);
    assert_eq!(config.store.min_dataset_size, 1000);
    assert!(!config.store.persist);
    assert_eq!(config.manager.shutdown_timeout_ms, 5000);
    assert_eq!(
        config.normalization.text_fields,
        vec!["text", "content", "data", "memory"]
    );
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_store_config_index_config() {
    let store = StoreConfig::new("notes", 8).with_persistence("/tmp/ember");

    let index = store.index_config();

    assert_eq!(index.dimension, 8);
    assert_eq!(index.persist_path, Some(PathBuf::from("/tmp/ember/notes")));
    assert_eq!(StoreConfig::new("notes", 8).index_config().persist_path, None);
}

// ========================================================================
// TOML parsing
// ========================================================================

#[test]
fn test_from_toml_overrides_defaults() {
    let toml_str = r#"
        [store]
        backend = "remote"
        dimension = 768
        algorithm = "brute-force"
        persist = true
        data_dir = "/var/lib/embervec"

        [logging]
        format = "json"
    "#;

    let config = EmberConfig::from_toml(toml_str).expect("parse");

    assert_eq!(config.store.backend, "remote");
    assert_eq!(config.store.dimension, 768);
    assert_eq!(config.store.algorithm, Algorithm::BruteForce);
    assert_eq!(config.store.data_dir, PathBuf::from("/var/lib/embervec"));
    assert_eq!(config.store.collection, "default");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_from_toml_rejects_bad_type() {
    let result = EmberConfig::from_toml("[store]\ndimension = \"wide\"");
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_to_toml_roundtrip() {
    let mut config = EmberConfig::default();
    config.store.dimension = 64;
    config.normalization.max_chars = Some(512);

    let toml_str = config.to_toml().expect("serialize");
    let parsed = EmberConfig::from_toml(&toml_str).expect("parse");

    assert_eq!(parsed, config);
}

// ========================================================================
// Validation
// ========================================================================

#[test]
fn test_validate_dimension_range() {
    let mut config = EmberConfig::default();
    config.store.dimension = 0;

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("store.dimension"));
}

#[test]
fn test_validate_collection_name() {
    for name in ["", "..", "a/b", "a\\b"] {
        let mut config = EmberConfig::default();
        config.store.collection = name.to_string();
        assert!(config.validate().is_err(), "accepted {name:?}");
    }
}

#[test]
fn test_validate_logging() {
    let mut config = EmberConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    let mut config = EmberConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_manager_and_normalization() {
    let mut config = EmberConfig::default();
    config.manager.normalize_batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = EmberConfig::default();
    config.normalization.text_fields.clear();
    assert!(config.validate().is_err());

    let mut config = EmberConfig::default();
    config.normalization.max_chars = Some(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_config_error_converts_to_error() {
    let err: crate::error::Error = ConfigError::ParseError("bad".to_string()).into();
    assert_eq!(err.code(), "EMBER-013");
}

// ========================================================================
// File and environment layering
// ========================================================================

#[test]
#[serial]
fn test_load_from_missing_file_uses_defaults() {
    let config = EmberConfig::load_from_path("/nonexistent/embervec.toml").expect("load");
    assert_eq!(config, EmberConfig::default());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("embervec.toml");
    std::fs::write(&path, "[store]\ndimension = 128\ncollection = \"docs\"\n").unwrap();

    std::env::set_var("EMBERVEC_STORE__DIMENSION", "256");
    let result = EmberConfig::load_from_path(&path);
    std::env::remove_var("EMBERVEC_STORE__DIMENSION");

    let config = result.expect("load");
    assert_eq!(config.store.dimension, 256);
    assert_eq!(config.store.collection, "docs");
}
