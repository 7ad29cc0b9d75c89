// src/errors.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Tweak definitions not found at {0}")]
    Missing(PathBuf),

    #[error("Failed to read tweak definitions at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Syntax error in JSON file at {path}: {source}")]
    Corrupted {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Duplicate tweak id '{0}' in tweak definitions")]
    DuplicateId(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Syntax error in JSON file at {path}: {source}")]
    Corrupted {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures of a single engine operation. Converted into an
/// `OperationResult` before leaving the engine.
#[derive(Error, Debug)]
pub enum TweakError {
    #[error("Tweak '{0}' not found.")]
    NotFound(String),

    #[error("No undo data for '{0}'.")]
    NoUndoData(String),

    #[error("Error applying '{title}': {cause:#}")]
    ApplyFailed {
        title: String,
        cause: anyhow::Error,
    },

    #[error("Error reverting '{title}': {cause:#}")]
    RevertFailed {
        title: String,
        cause: anyhow::Error,
    },
}
