// ⏱️ Sequencer
// Stable time ordering + JSON array serialization + atomic artifact write

use crate::error::Result;
use crate::projection::OutputRecord;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sort by time ascending. Stable: same-time routes keep their input order.
pub fn sequence(records: &mut [OutputRecord]) {
    records.sort_by_key(|r| r.time);
}

/// Serialize as a compact JSON array, one object per record
pub fn to_json(records: &[OutputRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Write `contents` to `destination` through a sibling temp file and a rename,
/// so readers never observe a half-written artifact. Concurrent writers to the
/// same destination race; the last rename stands.
pub fn write_atomic(destination: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = temp_sibling(destination);

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });

    let result = written.and_then(|_| fs::rename(&temp_path, destination));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    Ok(result?)
}

fn temp_sibling(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact.json");
    let temp_name = format!(".{}.{}.tmp", name, uuid::Uuid::new_v4());

    match destination.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}
