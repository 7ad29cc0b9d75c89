// src/config.rs

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_FILE, DEFAULT_WINDOW_POSITION, DEFAULT_WINDOW_SIZE, TWEAKS_FILE, UNDO_FILE,
};

/// Locations of the three JSON stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub tweaks: PathBuf,
    pub undo: PathBuf,
    pub config: PathBuf,
}

impl AppPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            tweaks: dir.join(TWEAKS_FILE),
            undo: dir.join(UNDO_FILE),
            config: dir.join(CONFIG_FILE),
        }
    }

    /// Stores next to the running executable, or in the working directory
    /// if its location can't be determined.
    pub fn from_executable() -> Self {
        let dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(&dir)
    }
}

/// Window geometry remembered between runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub size: [f32; 2],
    pub position: [f32; 2],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
            position: DEFAULT_WINDOW_POSITION,
        }
    }
}

impl WindowConfig {
    /// Missing or unreadable configuration falls back to the defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(
                    "Ignoring malformed window config '{}': {}",
                    path.display(),
                    e
                );
                Self::default()
            }),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read '{}': {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize window config")?;
        fs::write(path, text).with_context(|| format!("Failed to write '{}'", path.display()))
    }
}
