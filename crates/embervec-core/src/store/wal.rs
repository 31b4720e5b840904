//! `collection.wal`: mutations appended since the last checkpoint.
//!
//! One JSON entry per line. A checkpoint writes the full state (`index.*`,
//! `payloads.json`) and then removes the log, so connecting replays whatever
//! the log still holds on top of the last checkpoint. Entries are upserts and
//! deletes of whole points, which makes replaying an already checkpointed
//! suffix harmless.

use crate::error::Result;
use crate::point::{Payload, Point};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub(crate) const WAL_FILE: &str = "collection.wal";

pub(crate) fn wal_path(dir: &Path) -> PathBuf {
    dir.join(WAL_FILE)
}

/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum WalEntry {
    /// Points stored under their ids, replacing earlier versions.
    Upsert { points: Vec<WalRecord> },
    /// Ids removed from the collection.
    Delete { ids: Vec<u64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WalRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub payload: Payload,
}

impl From<Point> for WalRecord {
    fn from(point: Point) -> Self {
        Self {
            id: point.id,
            vector: point.vector,
            payload: point.payload,
        }
    }
}

/// Append handle on the log of one collection.
pub(crate) struct Wal {
    file: File,
}

impl Wal {
    /// Opens the log for appending, creating it if needed.
    ///
    /// A log whose last append was torn gets a line break first, so the next
    /// entry starts on a fresh line.
    pub(crate) fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(wal_path(dir))?;

        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }
        Ok(Self { file })
    }

    /// Appends one entry and syncs it to disk.
    pub(crate) fn append(&mut self, entry: &WalEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        Ok(())
    }
}

/// Reads every entry of the log under `dir`; a missing log is empty.
///
/// Lines that do not parse (a torn append) are skipped with a warning.
pub(crate) fn read(dir: &Path) -> Result<Vec<WalEntry>> {
    let path = wal_path(dir);
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for (number, line) in data.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(error = %e, line = number + 1, path = %path.display(), "Skipping unreadable log entry");
            }
        }
    }
    Ok(entries)
}

/// Deletes the log under `dir`, if any.
pub(crate) fn remove(dir: &Path) -> Result<()> {
    match std::fs::remove_file(wal_path(dir)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
