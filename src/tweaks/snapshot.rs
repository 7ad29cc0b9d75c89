// src/tweaks/snapshot.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{
    registry::RegistrySnapshot, scheduled_task::ScheduledTaskSnapshot, service::ServiceSnapshot,
};
use crate::utils::Platform;

/// State captured before an action ran: the action itself plus the
/// kind-specific original value. Power plan, command and cleanup actions
/// never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OriginalActionState {
    #[serde(rename = "reg")]
    Registry(RegistrySnapshot),
    #[serde(rename = "service")]
    Service(ServiceSnapshot),
    #[serde(rename = "schtask")]
    ScheduledTask(ScheduledTaskSnapshot),
}

impl OriginalActionState {
    /// Puts the captured state back.
    pub fn restore(&self, platform: &Platform) -> Result<()> {
        match self {
            OriginalActionState::Registry(snapshot) => snapshot.restore(platform),
            OriginalActionState::Service(snapshot) => snapshot.restore(platform),
            OriginalActionState::ScheduledTask(snapshot) => snapshot.restore(platform),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OriginalActionState::Registry(_) => "reg",
            OriginalActionState::Service(_) => "service",
            OriginalActionState::ScheduledTask(_) => "schtask",
        }
    }
}
