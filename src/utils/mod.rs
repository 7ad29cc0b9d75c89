// src/utils/mod.rs

pub mod registry;
pub mod shell;
#[cfg(windows)]
pub mod windows;

use std::{
    env,
    path::{Path, PathBuf},
};

use registry::RegistryAccess;
use shell::CommandRunner;

/// The operating-system facilities the tweak actions act on.
pub struct Platform {
    pub registry: Box<dyn RegistryAccess>,
    pub shell: Box<dyn CommandRunner>,
    temp_dir: Option<PathBuf>,
}

impl Platform {
    pub fn new(registry: Box<dyn RegistryAccess>, shell: Box<dyn CommandRunner>) -> Self {
        Self {
            registry,
            shell,
            temp_dir: None,
        }
    }

    /// The live registry and `cmd.exe`.
    #[cfg(windows)]
    pub fn system() -> Self {
        Self::new(
            Box::new(registry::WinRegistry),
            Box::new(shell::SystemShell),
        )
    }

    /// Pins the directory the temp cleanup works on instead of reading `TEMP`.
    pub fn with_temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Temporary directory as resolved from the `TEMP` environment variable
    /// at call time.
    ///
    /// # Returns
    ///
    /// - `Some(PathBuf)` if a directory was pinned or `TEMP` is set.
    /// - `None` if `TEMP` is unset or empty. There is no fallback to `TMP`
    ///   or the user profile.
    pub fn temp_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.temp_dir {
            return Some(dir.clone());
        }
        env::var_os("TEMP")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }
}
