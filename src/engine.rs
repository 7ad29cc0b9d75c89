// src/engine.rs

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use crate::{
    backup::BackupStore,
    constants::RECOMMENDED_TWEAK_IDS,
    errors::TweakError,
    tweaks::{catalog::Catalog, Tweak},
    utils::Platform,
};

/// Observed status of one tweak.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TweakState {
    pub is_applied: bool,
    pub can_revert: bool,
    /// Set when the status could not be determined.
    pub error: Option<String>,
}

/// What the operator can do with a tweak in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// One-time tweaks can always be run again.
    Run,
    Apply,
    Revert { available: bool },
}

impl TweakState {
    fn failed() -> Self {
        Self {
            is_applied: false,
            can_revert: false,
            error: Some("Failed to get state".to_string()),
        }
    }

    pub fn next_action(&self, tweak: &Tweak) -> NextAction {
        if tweak.one_time {
            NextAction::Run
        } else if self.is_applied {
            NextAction::Revert {
                available: self.can_revert,
            }
        } else {
            NextAction::Apply
        }
    }
}

/// Outcome of an apply or revert, ready to show to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl From<Result<String, TweakError>> for OperationResult {
    fn from(result: Result<String, TweakError>) -> Self {
        match result {
            Ok(message) => Self {
                success: true,
                message,
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Owns the catalog, the undo data and the platform, and runs every tweak
/// operation. Operations block until done and are meant to be issued one at
/// a time.
pub struct TweakEngine {
    catalog: Catalog,
    backups: BackupStore,
    platform: Platform,
}

impl TweakEngine {
    pub fn new(catalog: Catalog, backups: BackupStore, platform: Platform) -> Self {
        Self {
            catalog,
            backups,
            platform,
        }
    }

    /// Loads both stores. Any error here should stop the application.
    pub fn load(tweaks_path: &Path, undo_path: &Path, platform: Platform) -> anyhow::Result<Self> {
        let catalog = Catalog::load(tweaks_path)?;
        let backups = BackupStore::load(undo_path)?;
        info!(
            "Loaded {} tweaks and undo data for {} of them.",
            catalog.len(),
            backups.len()
        );
        Ok(Self::new(catalog, backups, platform))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Status of every tweak, in catalog order.
    pub fn states(&self) -> IndexMap<String, TweakState> {
        self.catalog
            .tweaks()
            .map(|tweak| (tweak.id.clone(), self.state_of(tweak)))
            .collect()
    }

    pub fn state_of(&self, tweak: &Tweak) -> TweakState {
        let mut is_applied = true;
        for action in &tweak.actions {
            match action.probe(&self.platform) {
                Ok(true) => {}
                Ok(false) => {
                    is_applied = false;
                    break;
                }
                Err(e) => {
                    warn!("{} -> Failed to get state: {:#}", tweak.id, e);
                    return TweakState::failed();
                }
            }
        }
        trace!("{} -> applied: {}", tweak.id, is_applied);

        TweakState {
            is_applied,
            can_revert: !tweak.one_time && self.backups.contains(&tweak.id),
            error: None,
        }
    }

    /// Applies a tweak, backing up its current state first unless it is a
    /// one-time tweak. Stops at the first failing action.
    pub fn apply(&mut self, id: &str) -> OperationResult {
        let result = self.try_apply(id);
        match &result {
            Ok(message) => info!("{} -> {}", id, message),
            Err(e) => warn!("{} -> {}", id, e),
        }
        result.into()
    }

    fn try_apply(&mut self, id: &str) -> Result<String, TweakError> {
        let tweak = self
            .catalog
            .find(id)
            .ok_or_else(|| TweakError::NotFound(id.to_string()))?;

        if !tweak.one_time {
            self.backups.snapshot(tweak, &self.platform);
        }

        for (index, action) in tweak.actions.iter().enumerate() {
            debug!(
                "{} -> Applying action {} of {} ({}).",
                id,
                index + 1,
                tweak.actions.len(),
                action.kind()
            );
            action
                .apply(&self.platform)
                .map_err(|cause| TweakError::ApplyFailed {
                    title: tweak.title.clone(),
                    cause,
                })?;
        }

        Ok(format!("'{}' applied successfully.", tweak.title))
    }

    /// Restores the state captured when the tweak was last applied.
    pub fn revert(&mut self, id: &str) -> OperationResult {
        let result = self.try_revert(id);
        match &result {
            Ok(message) => info!("{} -> {}", id, message),
            Err(e) => warn!("{} -> {}", id, e),
        }
        result.into()
    }

    fn try_revert(&mut self, id: &str) -> Result<String, TweakError> {
        let title = match (self.catalog.find(id), self.backups.get(id)) {
            (_, None) => return Err(TweakError::NoUndoData(id.to_string())),
            (Some(tweak), Some(_)) => tweak.title.clone(),
            (None, Some(entry)) => entry.title.clone(),
        };

        self.backups
            .restore(id, &self.platform)
            .map_err(|cause| TweakError::RevertFailed {
                title: title.clone(),
                cause,
            })?;

        Ok(format!("'{}' reverted successfully.", title))
    }

    /// Recommended tweaks that are not applied yet.
    pub fn recommendations(&self) -> Vec<&Tweak> {
        recommendations(&self.catalog, &self.states())
    }
}

/// The tweaks of [`RECOMMENDED_TWEAK_IDS`], in that order, that have a
/// status in `states` and are not applied.
pub fn recommendations<'a>(
    catalog: &'a Catalog,
    states: &IndexMap<String, TweakState>,
) -> Vec<&'a Tweak> {
    RECOMMENDED_TWEAK_IDS
        .iter()
        .filter(|id| states.get(**id).is_some_and(|state| !state.is_applied))
        .filter_map(|id| catalog.find(id))
        .collect()
}
