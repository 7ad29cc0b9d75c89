// src/tweaks/mod.rs

pub mod catalog;
pub mod cleanup;
pub mod command;
pub mod method;
pub mod power;
pub mod registry;
pub mod scheduled_task;
pub mod service;
pub mod snapshot;

use anyhow::Result;
use cleanup::CleanupAction;
use command::CommandAction;
use method::TweakMethod;
use power::PowerPlanAction;
use registry::RegistryAction;
use scheduled_task::ScheduledTaskAction;
use serde::{Deserialize, Serialize};
use service::ServiceAction;
use snapshot::OriginalActionState;

use crate::utils::Platform;

/// A single typed operation of a tweak, tagged by `type` in the definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "reg")]
    Registry(RegistryAction),
    #[serde(rename = "service")]
    Service(ServiceAction),
    #[serde(rename = "schtask")]
    ScheduledTask(ScheduledTaskAction),
    #[serde(rename = "power")]
    PowerPlan,
    #[serde(rename = "cmd")]
    Command(CommandAction),
    #[serde(rename = "cleanup")]
    Cleanup(CleanupAction),
}

impl Action {
    /// The handler implementing this action's kind.
    pub fn method(&self) -> &dyn TweakMethod {
        match self {
            Action::Registry(action) => action,
            Action::Service(action) => action,
            Action::ScheduledTask(action) => action,
            Action::PowerPlan => &PowerPlanAction,
            Action::Command(action) => action,
            Action::Cleanup(action) => action,
        }
    }

    pub fn probe(&self, platform: &Platform) -> Result<bool> {
        self.method().probe(platform)
    }

    pub fn apply(&self, platform: &Platform) -> Result<()> {
        self.method().apply(platform)
    }

    pub fn snapshot(&self, platform: &Platform) -> Result<Option<OriginalActionState>> {
        self.method().snapshot(platform)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Registry(_) => "reg",
            Action::Service(_) => "service",
            Action::ScheduledTask(_) => "schtask",
            Action::PowerPlan => "power",
            Action::Command(_) => "cmd",
            Action::Cleanup(_) => "cleanup",
        }
    }
}

/// Represents a single named change that can be applied to the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweak {
    /// Unique identifier across the whole catalog.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Shown to the operator for confirmation before the tweak runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Category the tweak was listed under.
    #[serde(skip)]
    pub category: String,
    /// One-time tweaks are never backed up and can't be reverted.
    #[serde(default)]
    pub one_time: bool,
    pub actions: Vec<Action>,
}
