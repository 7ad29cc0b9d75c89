// src/tweaks/registry.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, trace};

use super::{method::TweakMethod, snapshot::OriginalActionState};
use crate::utils::{
    registry::{
        Hive, RegistryKeyValue, REG_BINARY, REG_DWORD, REG_EXPAND_SZ, REG_MULTI_SZ, REG_QWORD,
        REG_SZ,
    },
    Platform,
};

/// Sets one registry value to declared data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAction {
    pub hive: Hive,
    /// Key path below the hive (e.g., "SOFTWARE\\Policies\\...").
    pub key: String,
    /// Name of the registry value to modify.
    pub name: String,
    pub data: RegistryData,
    pub data_type: RegistryDataType,
}

/// Declared data as written in the catalog: a number for `REG_DWORD`, text
/// for `REG_SZ` and hex text for `REG_BINARY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryData {
    Number(u64),
    Text(String),
}

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RegistryDataType {
    REG_SZ,
    REG_DWORD,
    REG_BINARY,
}

impl RegistryAction {
    /// The typed value this action writes. Binary data is hex-decoded.
    pub fn target_value(&self) -> Result<RegistryKeyValue> {
        match (self.data_type, &self.data) {
            (RegistryDataType::REG_DWORD, RegistryData::Number(n)) => u32::try_from(*n)
                .map(RegistryKeyValue::Dword)
                .with_context(|| format!("REG_DWORD data {} for '{}' is out of range", n, self.name)),
            (RegistryDataType::REG_SZ, RegistryData::Text(s)) => {
                Ok(RegistryKeyValue::String(s.clone()))
            }
            (RegistryDataType::REG_BINARY, RegistryData::Text(s)) => hex::decode(s)
                .map(RegistryKeyValue::Binary)
                .with_context(|| format!("REG_BINARY data for '{}' is not valid hex", self.name)),
            (data_type, data) => anyhow::bail!(
                "Data {:?} for '{}' does not match declared type {}",
                data,
                self.name,
                data_type
            ),
        }
    }

    fn location(&self) -> String {
        format!("{}\\{}\\{}", self.hive, self.key, self.name)
    }
}

impl TweakMethod for RegistryAction {
    fn probe(&self, platform: &Platform) -> Result<bool> {
        let target = self.target_value()?;
        let current = platform
            .registry
            .read_value(self.hive, &self.key, &self.name)
            .with_context(|| format!("Failed to read '{}'", self.location()))?;

        trace!("'{}' -> current {:?}, declared {}", self.location(), current, target);
        Ok(current.is_some_and(|value| value.matches(&target)))
    }

    fn apply(&self, platform: &Platform) -> Result<()> {
        let target = self.target_value()?;
        platform
            .registry
            .write_value(self.hive, &self.key, &self.name, &target)
            .with_context(|| format!("Failed to set '{}'", self.location()))?;
        debug!("Set '{}' to {}.", self.location(), target);
        Ok(())
    }

    fn snapshot(&self, platform: &Platform) -> Result<Option<OriginalActionState>> {
        let current = platform
            .registry
            .read_value(self.hive, &self.key, &self.name)
            .with_context(|| format!("Failed to read original value of '{}'", self.location()))?;

        let original = match current {
            Some(value) => RegistryOriginal::from_value(&value),
            None => RegistryOriginal::Missing {
                did_not_exist: true,
            },
        };
        Ok(Some(OriginalActionState::Registry(RegistrySnapshot {
            action: self.clone(),
            original,
        })))
    }
}

/// Value found before a registry action ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryOriginal {
    Value {
        original_value: OriginalValue,
        original_type_id: u32,
    },
    /// The value did not exist, reverting deletes it.
    Missing { did_not_exist: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OriginalValue {
    Number(u64),
    Text(String),
    List(Vec<String>),
}

impl RegistryOriginal {
    pub fn from_value(value: &RegistryKeyValue) -> Self {
        let original_value = match value {
            RegistryKeyValue::Dword(v) => OriginalValue::Number(u64::from(*v)),
            RegistryKeyValue::Qword(v) => OriginalValue::Number(*v),
            RegistryKeyValue::String(s) | RegistryKeyValue::ExpandString(s) => {
                OriginalValue::Text(s.clone())
            }
            RegistryKeyValue::MultiString(items) => OriginalValue::List(items.clone()),
            RegistryKeyValue::Binary(bytes) => OriginalValue::Text(hex::encode(bytes)),
        };
        RegistryOriginal::Value {
            original_value,
            original_type_id: value.type_id(),
        }
    }

    /// The value to write back, `None` when reverting means deleting.
    pub fn to_value(&self) -> Result<Option<RegistryKeyValue>> {
        let (original_value, original_type_id) = match self {
            RegistryOriginal::Missing { .. } => return Ok(None),
            RegistryOriginal::Value {
                original_value,
                original_type_id,
            } => (original_value, *original_type_id),
        };

        let value = match (original_type_id, original_value) {
            (REG_DWORD, OriginalValue::Number(n)) => RegistryKeyValue::Dword(
                u32::try_from(*n).context("Original REG_DWORD value is out of range")?,
            ),
            (REG_QWORD, OriginalValue::Number(n)) => RegistryKeyValue::Qword(*n),
            (REG_SZ, OriginalValue::Text(s)) => RegistryKeyValue::String(s.clone()),
            (REG_EXPAND_SZ, OriginalValue::Text(s)) => RegistryKeyValue::ExpandString(s.clone()),
            (REG_MULTI_SZ, OriginalValue::List(items)) => {
                RegistryKeyValue::MultiString(items.clone())
            }
            (REG_BINARY, OriginalValue::Text(s)) => RegistryKeyValue::Binary(
                hex::decode(s).context("Original REG_BINARY value is not valid hex")?,
            ),
            (type_id, value) => anyhow::bail!(
                "Original value {:?} does not match registry type {}",
                value,
                type_id
            ),
        };
        Ok(Some(value))
    }
}

/// A registry action together with the value it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(flatten)]
    pub action: RegistryAction,
    #[serde(flatten)]
    pub original: RegistryOriginal,
}

impl RegistrySnapshot {
    /// Deletes the value if it did not exist before, else writes the
    /// original value and type back, recreating the key if needed.
    pub fn restore(&self, platform: &Platform) -> Result<()> {
        let action = &self.action;
        match self.original.to_value()? {
            Some(value) => {
                platform
                    .registry
                    .write_value(action.hive, &action.key, &action.name, &value)
                    .with_context(|| format!("Failed to restore '{}'", action.location()))?;
                debug!("Restored '{}' to {}.", action.location(), value);
            }
            None => {
                platform
                    .registry
                    .delete_value(action.hive, &action.key, &action.name)
                    .with_context(|| format!("Failed to delete '{}'", action.location()))?;
                debug!("Deleted '{}'.", action.location());
            }
        }
        Ok(())
    }
}
