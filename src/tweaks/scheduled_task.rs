// src/tweaks/scheduled_task.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{method::TweakMethod, snapshot::OriginalActionState};
use crate::utils::{shell::CommandOutput, Platform};

/// Enables or disables a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTaskAction {
    pub name: String,
    /// `enable` or `disable`, passed to `schtasks /change` as a flag.
    pub state: String,
}

/// Whether the last whitespace-delimited word of `schtasks /query` output
/// (the status column of the only row) contains `state`, ignoring case.
pub fn status_matches(output: &str, state: &str) -> bool {
    output.contains("Status")
        && output
            .split_whitespace()
            .last()
            .is_some_and(|status| status.to_lowercase().contains(&state.to_lowercase()))
}

fn query_task(platform: &Platform, name: &str) -> Result<CommandOutput> {
    platform
        .shell
        .run(&format!("schtasks /query /tn \"{}\"", name))
        .with_context(|| format!("Failed to query scheduled task '{}'", name))
}

fn change_task(platform: &Platform, name: &str, flag: &str) -> Result<()> {
    let output = platform
        .shell
        .run(&format!("schtasks /change /tn \"{}\" /{}", name, flag))
        .with_context(|| format!("Failed to change scheduled task '{}'", name))?;
    if !output.success() {
        anyhow::bail!(
            "Failed to {} scheduled task '{}': {}",
            flag,
            name,
            output.failure_summary()
        );
    }
    debug!("Scheduled task '{}' -> /{}.", name, flag);
    Ok(())
}

impl TweakMethod for ScheduledTaskAction {
    fn probe(&self, platform: &Platform) -> Result<bool> {
        let output = query_task(platform, &self.name)?;
        trace!(
            "Scheduled task '{}' -> status {:?}",
            self.name,
            output.stdout.split_whitespace().last()
        );
        Ok(status_matches(&output.stdout, &self.state))
    }

    fn apply(&self, platform: &Platform) -> Result<()> {
        change_task(platform, &self.name, &self.state)
    }

    fn snapshot(&self, platform: &Platform) -> Result<Option<OriginalActionState>> {
        let output = query_task(platform, &self.name)?;
        if !output.success() {
            debug!(
                "Scheduled task '{}' could not be queried, nothing to back up: {}",
                self.name,
                output.failure_summary()
            );
            return Ok(None);
        }

        let original_state = if output.stdout.contains("Disabled") {
            "Disabled"
        } else {
            "Enabled"
        };
        Ok(Some(OriginalActionState::ScheduledTask(
            ScheduledTaskSnapshot {
                action: self.clone(),
                original_state: original_state.to_string(),
            },
        )))
    }
}

/// A scheduled task action together with the label (`Enabled`/`Disabled`)
/// the task had before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTaskSnapshot {
    #[serde(flatten)]
    pub action: ScheduledTaskAction,
    pub original_state: String,
}

impl ScheduledTaskSnapshot {
    pub fn restore(&self, platform: &Platform) -> Result<()> {
        let flag = if self.original_state.to_lowercase().starts_with("disable") {
            "disable"
        } else {
            "enable"
        };
        change_task(platform, &self.action.name, flag)
    }
}
