//! Tests for `wal` module

use super::wal::{self, Wal, WalEntry, WalRecord};
use crate::point::payload_from_json;
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;

fn upsert(id: u64) -> WalEntry {
    WalEntry::Upsert {
        points: vec![WalRecord {
            id,
            vector: vec![id as f32, 0.5],
            payload: payload_from_json(json!({ "seq": id })),
        }],
    }
}

#[test]
fn test_missing_log_reads_empty() {
    let temp_dir = TempDir::new().unwrap();
    assert!(wal::read(temp_dir.path()).unwrap().is_empty());
    wal::remove(temp_dir.path()).unwrap();
}

#[test]
fn test_entries_read_back_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut log = Wal::open(temp_dir.path()).unwrap();
    log.append(&upsert(1)).unwrap();
    log.append(&WalEntry::Delete { ids: vec![1, 9] }).unwrap();
    log.append(&upsert(2)).unwrap();

    let entries = wal::read(temp_dir.path()).unwrap();

    assert_eq!(
        entries,
        vec![upsert(1), WalEntry::Delete { ids: vec![1, 9] }, upsert(2)]
    );
}

#[test]
fn test_entry_format_is_tagged_json_line() {
    let temp_dir = TempDir::new().unwrap();
    let mut log = Wal::open(temp_dir.path()).unwrap();
    log.append(&WalEntry::Delete { ids: vec![4] }).unwrap();

    let text = std::fs::read_to_string(wal::wal_path(temp_dir.path())).unwrap();

    assert_eq!(text, "{\"op\":\"delete\",\"ids\":[4]}\n");
}

#[test]
fn test_torn_tail_is_skipped_and_reopen_starts_new_line() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut log = Wal::open(temp_dir.path()).unwrap();
        log.append(&upsert(1)).unwrap();
    }
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(wal::wal_path(temp_dir.path()))
        .unwrap();
    file.write_all(b"{\"op\":\"upsert\",\"poi").unwrap();
    drop(file);

    let mut log = Wal::open(temp_dir.path()).unwrap();
    log.append(&upsert(2)).unwrap();

    let entries = wal::read(temp_dir.path()).unwrap();
    assert_eq!(entries, vec![upsert(1), upsert(2)]);
}

#[test]
fn test_remove_deletes_log() {
    let temp_dir = TempDir::new().unwrap();
    let mut log = Wal::open(temp_dir.path()).unwrap();
    log.append(&upsert(3)).unwrap();
    drop(log);

    wal::remove(temp_dir.path()).unwrap();

    assert!(!wal::wal_path(temp_dir.path()).exists());
    assert!(wal::read(temp_dir.path()).unwrap().is_empty());
}
