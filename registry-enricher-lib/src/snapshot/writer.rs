use super::model::{Snapshot, Stats};
use crate::Result;
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const LOG_TARGET: &str = "  snapshot";

/// Stamp `snapshot`, recompute its counters, and atomically replace the file at `path`.
///
/// The document is written to a temporary file next to `path` and renamed over it, so
/// readers see either the old snapshot or the new one, never a partial write.
pub fn write_snapshot(mut snapshot: Snapshot, path: &Path, now: DateTime<Utc>) -> Result<Snapshot> {
    snapshot.last_updated = Some(now);
    snapshot.stats = Stats::compute(&snapshot.tools);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).into_app_err_with(|| format!("creating directory '{}'", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir).into_app_err_with(|| format!("creating temporary file in '{}'", dir.display()))?;

    {
        let mut writer = BufWriter::new(&mut tmp);
        serde_json::to_writer_pretty(&mut writer, &snapshot).into_app_err_with(|| format!("writing snapshot '{}'", path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("flushing snapshot '{}'", path.display()))?;
    }

    let _ = tmp.persist(path).into_app_err_with(|| format!("replacing snapshot '{}'", path.display()))?;

    log::debug!(target: LOG_TARGET, "Wrote {} tools to '{}'", snapshot.tools.len(), path.display());
    Ok(snapshot)
}
