// src/tweaks/cleanup.rs

use std::{
    fs::{self, FileType},
    io,
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::method::TweakMethod;
use crate::utils::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupTarget {
    /// Everything inside the user's temporary directory.
    #[serde(rename = "temp")]
    Temp,
}

/// Best-effort deletion of files. Cannot be probed or reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupAction {
    pub target: CleanupTarget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub skipped: usize,
}

/// Removes every entry inside `dir`, leaving `dir` itself in place.
pub fn clean_directory(dir: &Path) -> Result<CleanupReport> {
    clean_directory_with(dir, remove_entry)
}

/// Like [`clean_directory`], with the per-entry removal supplied by the
/// caller. A failed removal is skipped and the enumeration continues.
pub fn clean_directory_with<F>(dir: &Path, remove: F) -> Result<CleanupReport>
where
    F: Fn(&Path, &FileType) -> io::Result<()>,
{
    let mut report = CleanupReport::default();
    if !dir.is_dir() {
        debug!("'{}' is not a directory, nothing to clean.", dir.display());
        return Ok(report);
    }

    let entries = fs::read_dir(dir).with_context(|| format!("Failed to list '{}'", dir.display()))?;
    for entry in entries {
        let outcome = entry.and_then(|entry| {
            let path = entry.path();
            let file_type = entry.file_type()?;
            remove(&path, &file_type).map(|_| path)
        });
        match outcome {
            Ok(path) => {
                report.removed += 1;
                debug!("Removed '{}'.", path.display());
            }
            Err(e) => {
                report.skipped += 1;
                debug!("Skipped an entry of '{}': {}", dir.display(), e);
            }
        }
    }
    Ok(report)
}

fn remove_entry(path: &Path, file_type: &FileType) -> io::Result<()> {
    if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else if file_type.is_symlink() {
        // Directory symlinks on Windows need remove_dir
        fs::remove_file(path).or_else(|_| fs::remove_dir(path))
    } else {
        fs::remove_file(path)
    }
}

impl TweakMethod for CleanupAction {
    fn apply(&self, platform: &Platform) -> Result<()> {
        match self.target {
            CleanupTarget::Temp => {
                let Some(dir) = platform.temp_dir() else {
                    info!("TEMP is not set, nothing to clean.");
                    return Ok(());
                };
                let report = clean_directory(&dir)?;
                info!(
                    "Cleaned '{}': {} removed, {} skipped.",
                    dir.display(),
                    report.removed,
                    report.skipped
                );
                Ok(())
            }
        }
    }
}
