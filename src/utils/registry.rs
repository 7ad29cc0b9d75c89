// src/utils/registry.rs

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub const REG_SZ: u32 = 1;
pub const REG_EXPAND_SZ: u32 = 2;
pub const REG_BINARY: u32 = 3;
pub const REG_DWORD: u32 = 4;
pub const REG_MULTI_SZ: u32 = 7;
pub const REG_QWORD: u32 = 11;

/// Root registry namespaces a tweak may address.
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Hive {
    HKCU,
    HKLM,
    HKCR,
    HKU,
    HKCC,
}

/// Enumeration of supported registry key value types.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RegistryKeyValue {
    Dword(u32),
    Qword(u64),
    String(String),
    ExpandString(String),
    MultiString(Vec<String>),
    Binary(Vec<u8>),
}

impl fmt::Display for RegistryKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKeyValue::Dword(v) => write!(f, "Dword({})", v),
            RegistryKeyValue::Qword(v) => write!(f, "Qword({})", v),
            RegistryKeyValue::String(v) => write!(f, "String({})", v),
            RegistryKeyValue::ExpandString(v) => write!(f, "ExpandString({})", v),
            RegistryKeyValue::MultiString(v) => write!(f, "MultiString({:?})", v),
            RegistryKeyValue::Binary(v) => write!(f, "Binary({})", hex::encode(v)),
        }
    }
}

impl RegistryKeyValue {
    /// Numeric registry type (`REG_*`) of this value.
    pub fn type_id(&self) -> u32 {
        match self {
            RegistryKeyValue::Dword(_) => REG_DWORD,
            RegistryKeyValue::Qword(_) => REG_QWORD,
            RegistryKeyValue::String(_) => REG_SZ,
            RegistryKeyValue::ExpandString(_) => REG_EXPAND_SZ,
            RegistryKeyValue::MultiString(_) => REG_MULTI_SZ,
            RegistryKeyValue::Binary(_) => REG_BINARY,
        }
    }

    /// Equality as seen by a probe.
    ///
    /// DWORD and QWORD compare by number, and REG_SZ and REG_EXPAND_SZ by
    /// text. Every other type must match in type and content.
    ///
    /// # Parameters
    ///
    /// - `other`: The value currently stored in the registry.
    ///
    /// # Returns
    ///
    /// - `true` if the stored value counts as this value.
    pub fn matches(&self, other: &RegistryKeyValue) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.as_text(), other.as_text()) {
            return a == b;
        }
        self == other
    }

    fn as_number(&self) -> Option<u64> {
        match self {
            RegistryKeyValue::Dword(v) => Some(u64::from(*v)),
            RegistryKeyValue::Qword(v) => Some(*v),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            RegistryKeyValue::String(s) | RegistryKeyValue::ExpandString(s) => Some(s),
            _ => None,
        }
    }

    /// Decodes the raw bytes the registry hands back.
    ///
    /// # Parameters
    ///
    /// - `vtype`: The `REG_*` type reported for the value.
    /// - `bytes`: The raw value data.
    ///
    /// # Returns
    ///
    /// - `Ok(RegistryKeyValue)` if the type is supported and the data is large enough.
    /// - `Err(anyhow::Error)` otherwise.
    pub fn from_raw(vtype: u32, bytes: &[u8]) -> Result<Self> {
        match vtype {
            REG_DWORD => {
                let raw: [u8; 4] = bytes
                    .get(..4)
                    .and_then(|b| b.try_into().ok())
                    .context("REG_DWORD data too small")?;
                Ok(RegistryKeyValue::Dword(u32::from_le_bytes(raw)))
            }
            REG_QWORD => {
                let raw: [u8; 8] = bytes
                    .get(..8)
                    .and_then(|b| b.try_into().ok())
                    .context("REG_QWORD data too small")?;
                Ok(RegistryKeyValue::Qword(u64::from_le_bytes(raw)))
            }
            REG_SZ => Ok(RegistryKeyValue::String(decode_utf16(bytes))),
            REG_EXPAND_SZ => Ok(RegistryKeyValue::ExpandString(decode_utf16(bytes))),
            REG_MULTI_SZ => Ok(RegistryKeyValue::MultiString(
                decode_utf16(bytes)
                    .split('\0')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            REG_BINARY => Ok(RegistryKeyValue::Binary(bytes.to_vec())),
            other => anyhow::bail!("Unsupported registry value type: {}", other),
        }
    }

    /// Encodes the value into the `(type, bytes)` pair the registry stores.
    pub fn to_raw(&self) -> (u32, Vec<u8>) {
        let bytes = match self {
            RegistryKeyValue::Dword(v) => v.to_le_bytes().to_vec(),
            RegistryKeyValue::Qword(v) => v.to_le_bytes().to_vec(),
            RegistryKeyValue::String(s) | RegistryKeyValue::ExpandString(s) => encode_utf16(s),
            RegistryKeyValue::MultiString(items) => {
                let mut joined = items.join("\0");
                joined.push('\0');
                encode_utf16(&joined)
            }
            RegistryKeyValue::Binary(data) => data.clone(),
        };
        (self.type_id(), bytes)
    }
}

fn decode_utf16(bytes: &[u8]) -> String {
    let wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&wide)
        .trim_end_matches('\0')
        .to_string()
}

/// UTF-16LE with the terminating nul the registry expects for string types.
fn encode_utf16(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|c| c.to_le_bytes())
        .collect()
}

/// Access to registry values, addressed by hive, key path and value name.
pub trait RegistryAccess: Send {
    /// Reads a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` if the value exists.
    /// - `Ok(None)` if the key or the value is missing.
    /// - `Err(anyhow::Error)` if the registry could not be read.
    fn read_value(&self, hive: Hive, key: &str, name: &str) -> Result<Option<RegistryKeyValue>>;

    /// Writes a value, creating the key and any missing parents first.
    fn write_value(&self, hive: Hive, key: &str, name: &str, value: &RegistryKeyValue)
        -> Result<()>;

    /// Deletes a value. A missing key or value counts as success.
    fn delete_value(&self, hive: Hive, key: &str, name: &str) -> Result<()>;
}

/// The live Windows registry.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WinRegistry;

#[cfg(windows)]
impl WinRegistry {
    fn root(hive: Hive) -> winreg::RegKey {
        use winreg::enums::{
            HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE,
            HKEY_USERS,
        };

        winreg::RegKey::predef(match hive {
            Hive::HKCU => HKEY_CURRENT_USER,
            Hive::HKLM => HKEY_LOCAL_MACHINE,
            Hive::HKCR => HKEY_CLASSES_ROOT,
            Hive::HKU => HKEY_USERS,
            Hive::HKCC => HKEY_CURRENT_CONFIG,
        })
    }

    fn reg_type(vtype: u32) -> Result<winreg::enums::RegType> {
        use winreg::enums::RegType;

        Ok(match vtype {
            REG_SZ => RegType::REG_SZ,
            REG_EXPAND_SZ => RegType::REG_EXPAND_SZ,
            REG_BINARY => RegType::REG_BINARY,
            REG_DWORD => RegType::REG_DWORD,
            REG_MULTI_SZ => RegType::REG_MULTI_SZ,
            REG_QWORD => RegType::REG_QWORD,
            other => anyhow::bail!("Unsupported registry value type: {}", other),
        })
    }
}

#[cfg(windows)]
impl RegistryAccess for WinRegistry {
    fn read_value(&self, hive: Hive, key: &str, name: &str) -> Result<Option<RegistryKeyValue>> {
        use winreg::enums::KEY_READ;

        let subkey = match Self::root(hive).open_subkey_with_flags(key, KEY_READ) {
            Ok(subkey) => subkey,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open subkey '{}\\{}'", hive, key))
            }
        };

        match subkey.get_raw_value(name) {
            Ok(value) => RegistryKeyValue::from_raw(value.vtype as u32, &value.bytes)
                .map(Some)
                .with_context(|| format!("Failed to decode value '{}' in '{}\\{}'", name, hive, key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read value '{}' in '{}\\{}'", name, hive, key)),
        }
    }

    fn write_value(
        &self,
        hive: Hive,
        key: &str,
        name: &str,
        value: &RegistryKeyValue,
    ) -> Result<()> {
        // create_subkey creates all intermediate subkeys if they don't exist
        let (subkey, _) = Self::root(hive)
            .create_subkey(key)
            .with_context(|| format!("Failed to create or open subkey '{}\\{}'", hive, key))?;

        let (vtype, bytes) = value.to_raw();
        subkey
            .set_raw_value(
                name,
                &winreg::RegValue {
                    bytes,
                    vtype: Self::reg_type(vtype)?,
                },
            )
            .with_context(|| format!("Failed to set value '{}' to {} in '{}\\{}'", name, value, hive, key))
    }

    fn delete_value(&self, hive: Hive, key: &str, name: &str) -> Result<()> {
        use winreg::enums::KEY_SET_VALUE;

        let subkey = match Self::root(hive).open_subkey_with_flags(key, KEY_SET_VALUE) {
            Ok(subkey) => subkey,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open subkey '{}\\{}'", hive, key))
            }
        };

        match subkey.delete_value(name) {
            Ok(_) => Ok(()),
            // The value does not exist; treat as success
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete value '{}' in '{}\\{}'", name, hive, key)),
        }
    }
}
