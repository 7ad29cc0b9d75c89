// src/tweaks/method.rs

use anyhow::Result;

use super::snapshot::OriginalActionState;
use crate::utils::Platform;

/// Trait defining the behavior of one kind of tweak action.
///
/// Only `apply` is mandatory. A kind that cannot tell whether it is in
/// effect keeps the default `probe`, which reports "not applied"; a kind
/// that cannot be undone keeps the default `snapshot`, which captures
/// nothing.
///
/// A kind that drives an external tool fails when the tool exits non-zero
/// and a later probe or restore depends on its effect (`sc`, `schtasks`,
/// `powercfg /setactive`). Free-form commands and best-effort steps only
/// log a non-zero exit.
pub trait TweakMethod {
    /// Checks if the declared state is currently in effect.
    fn probe(&self, _platform: &Platform) -> Result<bool> {
        Ok(false)
    }

    /// Makes the declared state so.
    fn apply(&self, platform: &Platform) -> Result<()>;

    /// Captures the current state so that it can be restored later.
    fn snapshot(&self, _platform: &Platform) -> Result<Option<OriginalActionState>> {
        Ok(None)
    }
}
