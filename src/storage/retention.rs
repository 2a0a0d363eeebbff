//! Cleanup of old per-cycle screenshot directories.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Default number of screenshot directories kept per item.
pub const DEFAULT_KEEP: usize = 10;

/// Outcome of one prune pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PruneReport {
    pub kept: usize,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Keeps the `keep` most recently modified subdirectories of `item_root` and
/// recursively deletes the rest.
///
/// Files directly inside `item_root` are never touched. A directory that cannot
/// be removed is logged and skipped. Only listing `item_root` itself can fail.
pub fn prune(item_root: &Path, keep: usize) -> Result<PruneReport> {
    let mut subdirs: Vec<(PathBuf, SystemTime)> = Vec::new();

    let entries = fs::read_dir(item_root)
        .with_context(|| format!("Failed to list {}", item_root.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        subdirs.push((path, mtime));
    }

    // Newest first
    subdirs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut report = PruneReport {
        kept: subdirs.len().min(keep),
        ..Default::default()
    };

    for (dir, _) in subdirs.into_iter().skip(keep) {
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                log::info!("Removed old screenshot directory: {}", dir.display());
                report.removed.push(dir);
            }
            Err(e) => {
                log::warn!("Failed to remove {}: {}", dir.display(), e);
                report.failed.push(dir);
            }
        }
    }

    Ok(report)
}
