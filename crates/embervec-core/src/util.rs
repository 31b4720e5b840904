//! Filesystem helpers shared by the index and store persistence code.

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes `data` to `path` through a temp file + rename, so readers never see
/// a half-written file.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&temp_path, path)
}
