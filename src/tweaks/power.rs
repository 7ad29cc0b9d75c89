// src/tweaks/power.rs

use anyhow::{Context, Result};
use tracing::debug;

use super::method::TweakMethod;
use crate::{
    constants::{BASE_POWER_PLAN_GUID, PRO_POWER_PLAN_GUID, PRO_POWER_PLAN_NAME},
    utils::Platform,
};

/// Activates the utility's own power scheme, creating it from the High
/// Performance scheme first. There is no per-instance configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerPlanAction;

impl TweakMethod for PowerPlanAction {
    fn probe(&self, platform: &Platform) -> Result<bool> {
        let output = platform
            .shell
            .run("powercfg /getactivescheme")
            .context("Failed to query the active power scheme")?;
        Ok(output.stdout.contains(PRO_POWER_PLAN_GUID))
    }

    fn apply(&self, platform: &Platform) -> Result<()> {
        // Both fail harmlessly once the scheme exists
        let duplicate = platform
            .shell
            .run(&format!(
                "powercfg /duplicatescheme {} {}",
                BASE_POWER_PLAN_GUID, PRO_POWER_PLAN_GUID
            ))
            .context("Failed to duplicate the base power scheme")?;
        if !duplicate.success() {
            debug!(
                "powercfg /duplicatescheme: {} (scheme may already exist)",
                duplicate.failure_summary()
            );
        }
        platform
            .shell
            .run(&format!(
                "powercfg /changename {} \"{}\"",
                PRO_POWER_PLAN_GUID, PRO_POWER_PLAN_NAME
            ))
            .context("Failed to rename the power scheme")?;

        let activate = platform
            .shell
            .run(&format!("powercfg /setactive {}", PRO_POWER_PLAN_GUID))
            .context("Failed to activate the power scheme")?;
        if !activate.success() {
            anyhow::bail!(
                "Failed to activate power scheme {}: {}",
                PRO_POWER_PLAN_GUID,
                activate.failure_summary()
            );
        }

        debug!("Activated power scheme '{}'.", PRO_POWER_PLAN_NAME);
        Ok(())
    }
}
