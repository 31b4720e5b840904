//! Tests for `memory` module

use super::memory::MemoryStore;
use super::payloads;
use super::wal;
use crate::config::StoreConfig;
use crate::error::Error;
use crate::filter::Filter;
use crate::index::{Algorithm, ProviderRegistry};
use crate::point::{payload_from_json, Payload};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn store(config: StoreConfig) -> MemoryStore {
    let store = MemoryStore::new(config, Arc::new(ProviderRegistry::with_defaults()));
    store.connect().unwrap();
    store
}

fn tag(value: &str) -> Payload {
    payload_from_json(json!({ "tag": value }))
}

/// Three points of dimension 3: two tagged "a", one tagged "b".
fn tagged_store() -> MemoryStore {
    let store = store(StoreConfig::new("tagged", 3));
    store
        .insert(
            &[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
            &[1, 2, 3],
            vec![tag("a"), tag("a"), tag("b")],
        )
        .unwrap();
    store
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn test_operations_fail_when_disconnected() {
    let store = MemoryStore::new(
        StoreConfig::new("idle", 2),
        Arc::new(ProviderRegistry::with_defaults()),
    );

    assert!(!store.is_connected());
    assert!(matches!(store.count(), Err(Error::NotConnected(_))));
    assert!(matches!(store.get(1), Err(Error::NotConnected(_))));
    assert!(matches!(
        store.search(&[1.0, 0.0], 1, None),
        Err(Error::NotConnected(_))
    ));
    assert!(matches!(
        store.insert(&[vec![1.0, 0.0]], &[1], vec![Payload::new()]),
        Err(Error::NotConnected(_))
    ));
}

#[test]
fn test_connect_and_disconnect_are_idempotent() {
    let store = tagged_store();

    store.connect().unwrap();
    assert_eq!(store.count().unwrap(), 3);

    store.disconnect().unwrap();
    store.disconnect().unwrap();
    assert!(!store.is_connected());
}

#[test]
fn test_connect_rejects_zero_dimension() {
    let store = MemoryStore::new(
        StoreConfig::new("broken", 0),
        Arc::new(ProviderRegistry::with_defaults()),
    );
    assert!(matches!(store.connect(), Err(Error::InvalidDimension(0))));
    assert!(!store.is_connected());
}

#[test]
fn test_reconnect_without_persistence_starts_empty() {
    let store = tagged_store();
    store.disconnect().unwrap();
    store.connect().unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

// =========================================================================
// CRUD
// =========================================================================

#[test]
fn test_insert_then_get_returns_payload() {
    let store = tagged_store();

    let record = store.get(2).unwrap().unwrap();

    assert_eq!(record.id, 2);
    assert_eq!(record.vector, vec![0.0, 1.0, 0.0]);
    assert_eq!(record.payload, tag("a"));
}

#[test]
fn test_get_after_delete_returns_nothing() {
    let store = tagged_store();

    assert!(store.delete(2).unwrap());
    assert!(!store.delete(2).unwrap());

    assert!(store.get(2).unwrap().is_none());
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_insert_length_mismatch() {
    let store = store(StoreConfig::new("c", 2));
    let err = store
        .insert(&[vec![1.0, 0.0]], &[1], vec![Payload::new(), Payload::new()])
        .unwrap_err();
    assert!(matches!(err, Error::LengthMismatch(_)));
}

#[test]
fn test_insert_dimension_mismatch_stores_nothing() {
    let store = store(StoreConfig::new("c", 2));
    let err = store
        .insert(
            &[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
            &[1, 2],
            vec![Payload::new(), Payload::new()],
        )
        .unwrap_err();

    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.list(None, 10, 0).unwrap().records.is_empty());
}

#[test]
fn test_update_replaces_vector_and_payload() {
    let store = tagged_store();

    store.update(1, vec![0.0, 1.0, 0.0], tag("c")).unwrap();

    let record = store.get(1).unwrap().unwrap();
    assert_eq!(record.vector, vec![0.0, 1.0, 0.0]);
    assert_eq!(record.payload, tag("c"));
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_update_missing_id() {
    let store = tagged_store();
    let err = store.update(99, vec![1.0, 0.0, 0.0], Payload::new()).unwrap_err();
    assert!(matches!(err, Error::PointNotFound(99)));
}

#[test]
fn test_update_wrong_dimension_leaves_point() {
    let store = tagged_store();
    assert!(store.update(1, vec![1.0], Payload::new()).is_err());
    assert_eq!(store.get(1).unwrap().unwrap().payload, tag("a"));
}

#[test]
fn test_delete_collection() {
    let store = tagged_store();

    store.delete_collection().unwrap();

    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.list(None, 10, 0).unwrap().total, 0);
    assert!(store.search(&[1.0, 0.0, 0.0], 3, None).unwrap().is_empty());
}

// =========================================================================
// Search and list
// =========================================================================

#[test]
fn test_tagged_scenario() {
    let store = tagged_store();

    let filter = Filter::from_json(&json!({"tag": "a"})).unwrap();
    let page = store.list(Some(&filter), 10, 0).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(
        page.records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2]
    );

    let hits = store.search(&[1.0, 0.0, 0.0], 1, None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    assert_eq!(hits[0].payload, tag("a"));
}

#[test]
fn test_list_total_ignores_limit() {
    let store = tagged_store();
    let filter = Filter::from_json(&json!({"tag": "a"})).unwrap();

    let page = store.list(Some(&filter), 1, 0).unwrap();

    assert_eq!(page.records.len(), 1);
    assert_eq!(page.total, 2);
}

#[test]
fn test_list_offset_pages_in_id_order() {
    let store = store(StoreConfig::new("paged", 2));
    let ids: Vec<u64> = vec![40, 10, 30, 20, 50];
    let vectors = vec![vec![1.0, 0.0]; ids.len()];
    store
        .insert(&vectors, &ids, vec![Payload::new(); ids.len()])
        .unwrap();

    let first = store.list(None, 2, 0).unwrap();
    let second = store.list(None, 2, 2).unwrap();
    let past_end = store.list(None, 2, 10).unwrap();

    assert_eq!(
        first.records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![10, 20]
    );
    assert_eq!(
        second.records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![30, 40]
    );
    assert!(past_end.records.is_empty());
    assert_eq!(past_end.total, 5);
}

#[test]
fn test_search_with_filter() {
    let store = tagged_store();
    let filter = Filter::from_json(&json!({"tag": "b"})).unwrap();

    let hits = store.search(&[1.0, 0.0, 0.0], 3, Some(&filter)).unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 3);
}

#[test]
fn test_search_with_range_filter_on_ann_path() {
    let mut config = StoreConfig::new("ranked", 2);
    config.min_dataset_size = 0;
    let store = store(config);
    let ids: Vec<u64> = (0..20).collect();
    let vectors: Vec<Vec<f32>> = ids.iter().map(|i| vec![1.0, *i as f32 * 0.1]).collect();
    let payloads = ids
        .iter()
        .map(|i| payload_from_json(json!({ "rank": i })))
        .collect();
    store.insert(&vectors, &ids, payloads).unwrap();

    let filter = Filter::from_json(&json!({"rank": {"gte": 15}})).unwrap();
    let hits = store.search(&[1.0, 2.0], 3, Some(&filter)).unwrap();

    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.id >= 15 && h.from_ann));
}

#[test]
fn test_small_collection_reports_linear_scan() {
    let mut config = StoreConfig::new("small", 3);
    config.min_dataset_size = 100;
    let store = store(config);
    let vectors: Vec<Vec<f32>> = (0..5).map(|i| vec![1.0, i as f32, 0.5]).collect();
    store
        .insert(&vectors, &[1, 2, 3, 4, 5], vec![Payload::new(); 5])
        .unwrap();

    let hits = store.search(&[1.0, 2.0, 0.5], 3, None).unwrap();

    assert_eq!(hits.len(), 3);
    let stats = store.stats().unwrap();
    assert!(!stats.last_search.unwrap().from_ann);
    assert!(!store.info().unwrap().ann_active);
}

#[test]
fn test_info_reports_configuration() {
    let mut config = StoreConfig::new("info", 3);
    config.algorithm = Algorithm::BruteForce;
    let store = store(config);

    let info = store.info().unwrap();

    assert_eq!(info.collection, "info");
    assert_eq!(info.dimension, 3);
    assert_eq!(info.count, 0);
    assert_eq!(info.algorithm, Algorithm::BruteForce);
    assert!(!info.ann_available);
    assert!(info.persist_path.is_none());
    assert!(!store.rebuild_index().unwrap());
}

// =========================================================================
// Persistence
// =========================================================================

#[test]
fn test_mutations_are_logged_until_flush() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("docs");
    let store = store(StoreConfig::new("docs", 3).with_persistence(temp_dir.path()));

    store
        .insert(&[vec![1.0, 0.0, 0.0]], &[7], vec![tag("x")])
        .unwrap();
    store.update(7, vec![0.0, 1.0, 0.0], tag("y")).unwrap();
    assert!(!store.delete(8).unwrap());

    // Single mutations append to the log instead of rewriting the collection.
    assert!(!payloads::payloads_path(&dir).exists());
    assert!(!dir.join("index.meta.json").exists());
    assert_eq!(wal::read(&dir).unwrap().len(), 2);

    store.flush().unwrap();

    let saved = payloads::read(&dir).unwrap();
    assert_eq!(saved.get(&7), Some(&tag("y")));
    assert!(!wal::wal_path(&dir).exists());
}

#[test]
fn test_crash_replays_log_onto_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("docs");
    let config = StoreConfig::new("docs", 2).with_persistence(temp_dir.path());

    let first = store(config.clone());
    first
        .insert(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[1, 2], vec![tag("a"), tag("b")])
        .unwrap();
    first.flush().unwrap();
    first.delete(1).unwrap();
    first.update(2, vec![1.0, 1.0], tag("c")).unwrap();
    drop(first);

    let second = store(config);

    assert_eq!(second.count().unwrap(), 1);
    assert!(second.get(1).unwrap().is_none());
    let record = second.get(2).unwrap().unwrap();
    assert_eq!(record.vector, vec![1.0, 1.0]);
    assert_eq!(record.payload, tag("c"));
    // Replayed entries are folded into a new checkpoint.
    assert!(!wal::wal_path(&dir).exists());
    assert_eq!(payloads::read(&dir).unwrap().get(&2), Some(&tag("c")));
}

#[test]
fn test_unwritable_data_dir_keeps_mutations_in_memory() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let store = store(StoreConfig::new("docs", 2).with_persistence(blocker.clone()));

    store
        .insert(&[vec![1.0, 0.0]], &[1], vec![tag("a")])
        .unwrap();
    assert_eq!(store.get(1).unwrap().unwrap().payload, tag("a"));

    store.update(1, vec![0.0, 1.0], tag("b")).unwrap();
    let record = store.get(1).unwrap().unwrap();
    assert_eq!(record.vector, vec![0.0, 1.0]);
    assert_eq!(record.payload, tag("b"));

    assert!(store.delete(1).unwrap());
    assert!(store.get(1).unwrap().is_none());
    assert!(store.flush().is_err());
}

#[test]
fn test_restart_restores_points() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new("docs", 3).with_persistence(temp_dir.path());

    let first = store(config.clone());
    first
        .insert(
            &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            &[1, 2],
            vec![tag("a"), tag("b")],
        )
        .unwrap();
    first.delete(1).unwrap();
    first.disconnect().unwrap();

    let second = store(config);

    assert_eq!(second.count().unwrap(), 1);
    assert!(second.get(1).unwrap().is_none());
    let record = second.get(2).unwrap().unwrap();
    assert_eq!(record.vector, vec![0.0, 1.0, 0.0]);
    assert_eq!(record.payload, tag("b"));
}

#[test]
fn test_corrupt_payloads_start_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new("docs", 2).with_persistence(temp_dir.path());
    let first = store(config.clone());
    first
        .insert(&[vec![1.0, 0.0]], &[1], vec![tag("a")])
        .unwrap();
    first.disconnect().unwrap();
    std::fs::write(payloads::payloads_path(&temp_dir.path().join("docs")), b"[[").unwrap();

    let second = store(config);

    let record = second.get(1).unwrap().unwrap();
    assert!(record.payload.is_empty());
}

#[test]
fn test_delete_collection_persists_empty_state() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new("docs", 2).with_persistence(temp_dir.path());
    let first = store(config.clone());
    first
        .insert(&[vec![1.0, 0.0]], &[1], vec![tag("a")])
        .unwrap();

    first.delete_collection().unwrap();
    drop(first);

    let second = store(config);
    assert_eq!(second.count().unwrap(), 0);
}
