//! `payloads.json`: the id -> payload map of a persisted collection.

use crate::error::Result;
use crate::point::Payload;
use crate::util::write_atomic;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub(crate) const PAYLOADS_FILE: &str = "payloads.json";

pub(crate) fn payloads_path(dir: &Path) -> PathBuf {
    dir.join(PAYLOADS_FILE)
}

pub(crate) fn read(dir: &Path) -> Result<BTreeMap<u64, Payload>> {
    let data = std::fs::read(payloads_path(dir))?;
    Ok(serde_json::from_slice(&data)?)
}

pub(crate) fn write(dir: &Path, payloads: &BTreeMap<u64, Payload>) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let data = serde_json::to_vec(payloads)?;
    write_atomic(&payloads_path(dir), &data)?;
    Ok(())
}
