// src/tweaks/command.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::method::TweakMethod;
use crate::utils::Platform;

/// Runs an arbitrary command line. Cannot be probed or reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAction {
    pub command: String,
    /// Variant used instead of `command` by a 64-bit process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command64: Option<String>,
}

impl CommandAction {
    pub fn command_for(&self, is_64bit: bool) -> &str {
        match (&self.command64, is_64bit) {
            (Some(command64), true) => command64,
            _ => &self.command,
        }
    }
}

impl TweakMethod for CommandAction {
    fn apply(&self, platform: &Platform) -> Result<()> {
        let command = self.command_for(cfg!(target_pointer_width = "64"));
        let output = platform
            .shell
            .run(command)
            .with_context(|| format!("Failed to run '{}'", command))?;

        if output.success() {
            debug!("'{}' -> {}", command, output.stdout.trim());
        } else {
            warn!("'{}' finished with {}", command, output.failure_summary());
        }
        Ok(())
    }
}
