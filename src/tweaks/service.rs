// src/tweaks/service.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{method::TweakMethod, snapshot::OriginalActionState};
use crate::utils::Platform;

const SERVICE_AUTO_START: u32 = 2;
const SERVICE_DISABLED: u32 = 4;

/// Sets the configured start mode of a Windows service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAction {
    pub name: String,
    /// Start mode as understood by `sc config` (`disabled`, `auto`, `demand`, ...).
    pub state: String,
}

/// Extracts the numeric start-type code from `sc qc` output, i.e. the `2`
/// of `START_TYPE         : 2   AUTO_START`.
pub fn parse_start_type(output: &str) -> Option<&str> {
    output
        .lines()
        .find(|line| line.contains("START_TYPE"))?
        .split_once(':')?
        .1
        .split_whitespace()
        .next()
}

/// Symbolic start mode for a start-type code read back from `sc qc`.
pub fn start_mode_for_code(code: &str) -> &'static str {
    match code {
        "1" | "3" => "demand",
        "2" => "auto",
        "4" => "disabled",
        _ => "demand",
    }
}

fn query_start_type(platform: &Platform, name: &str) -> Result<Option<String>> {
    let output = platform
        .shell
        .run(&format!("sc qc \"{}\"", name))
        .with_context(|| format!("Failed to query service '{}'", name))?;
    Ok(parse_start_type(&output.stdout).map(str::to_string))
}

fn set_start_mode(platform: &Platform, name: &str, mode: &str) -> Result<()> {
    let output = platform
        .shell
        .run(&format!("sc config \"{}\" start= {}", name, mode))
        .with_context(|| format!("Failed to configure service '{}'", name))?;
    if !output.success() {
        anyhow::bail!(
            "Failed to set start mode of service '{}' to '{}': {}",
            name,
            mode,
            output.failure_summary()
        );
    }
    debug!("Service '{}' start mode set to '{}'.", name, mode);
    Ok(())
}

impl TweakMethod for ServiceAction {
    /// Only `disabled` and `auto` can ever be reported as applied.
    fn probe(&self, platform: &Platform) -> Result<bool> {
        let expected = match self.state.as_str() {
            "disabled" => SERVICE_DISABLED,
            "auto" => SERVICE_AUTO_START,
            _ => return Ok(false),
        };

        let current = query_start_type(platform, &self.name)?;
        trace!("Service '{}' -> start type {:?}", self.name, current);
        Ok(current
            .and_then(|code| code.parse::<u32>().ok())
            .is_some_and(|code| code == expected))
    }

    fn apply(&self, platform: &Platform) -> Result<()> {
        set_start_mode(platform, &self.name, &self.state)
    }

    fn snapshot(&self, platform: &Platform) -> Result<Option<OriginalActionState>> {
        Ok(query_start_type(platform, &self.name)?.map(|original_state| {
            OriginalActionState::Service(ServiceSnapshot {
                action: self.clone(),
                original_state,
            })
        }))
    }
}

/// A service action together with the start-type code it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    #[serde(flatten)]
    pub action: ServiceAction,
    pub original_state: String,
}

impl ServiceSnapshot {
    pub fn restore(&self, platform: &Platform) -> Result<()> {
        set_start_mode(
            platform,
            &self.action.name,
            start_mode_for_code(&self.original_state),
        )
    }
}
