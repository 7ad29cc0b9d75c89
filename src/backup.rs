// src/backup.rs

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    errors::StoreError,
    tweaks::{snapshot::OriginalActionState, Tweak},
    utils::Platform,
};

/// What a tweak's actions looked like before the tweak was last applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub title: String,
    pub original_states: Vec<OriginalActionState>,
}

/// Undo data keyed by tweak id, mirrored to a JSON file after every change.
#[derive(Debug)]
pub struct BackupStore {
    path: PathBuf,
    entries: IndexMap<String, BackupEntry>,
}

impl BackupStore {
    /// Reads the store at `path`. A missing file is an empty store; a file
    /// that does not parse is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Corrupted {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No undo data at '{}', starting empty.", path.display());
                IndexMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&BackupEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captures the current state of every action of `tweak` that supports
    /// it and stores the result under the tweak's id, replacing any older
    /// entry. Nothing is stored when no action produced a state. Returns
    /// whether an entry was stored.
    pub fn snapshot(&mut self, tweak: &Tweak, platform: &Platform) -> bool {
        let mut original_states = Vec::new();
        for action in &tweak.actions {
            match action.snapshot(platform) {
                Ok(Some(state)) => original_states.push(state),
                Ok(None) => {}
                Err(e) => warn!(
                    "{} -> Failed to capture the state of a '{}' action, skipping it: {:#}",
                    tweak.id,
                    action.kind(),
                    e
                ),
            }
        }

        if original_states.is_empty() {
            debug!("{} -> Nothing to back up.", tweak.id);
            return false;
        }

        debug!(
            "{} -> Backed up {} action state(s).",
            tweak.id,
            original_states.len()
        );
        self.entries.insert(
            tweak.id.clone(),
            BackupEntry {
                title: tweak.title.clone(),
                original_states,
            },
        );
        self.persist();
        true
    }

    /// Restores every captured state of `id` in order. The first failure
    /// stops the restore and leaves the entry in place; only a complete
    /// restore removes it.
    pub fn restore(&mut self, id: &str, platform: &Platform) -> anyhow::Result<()> {
        let entry = self
            .entries
            .get(id)
            .with_context(|| format!("No undo data for '{}'.", id))?;

        for (index, state) in entry.original_states.iter().enumerate() {
            state.restore(platform).with_context(|| {
                format!(
                    "Failed to restore step {} of {} ({})",
                    index + 1,
                    entry.original_states.len(),
                    state.kind()
                )
            })?;
        }

        self.entries.shift_remove(id);
        info!("{} -> Restored and removed undo data.", id);
        self.persist();
        Ok(())
    }

    /// Writes the store to disk. Failures are logged; the in-memory state is
    /// kept either way.
    pub fn persist(&self) {
        if let Err(e) = self.write() {
            error!("Failed to save undo data: {}", e);
        }
    }

    fn write(&self) -> Result<(), StoreError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.entries
            .serialize(&mut serializer)
            .map_err(|source| StoreError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        fs::write(&self.path, buffer).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{failing_registry_platform, memory_platform},
        tweaks::{
            registry::{RegistryAction, RegistryData, RegistryDataType},
            service::ServiceAction,
            Action,
        },
        utils::registry::{Hive, RegistryAccess, RegistryKeyValue},
    };

    const TELEMETRY_KEY: &str = "SOFTWARE\\Policies\\Microsoft\\Windows\\DataCollection";

    fn telemetry_tweak() -> Tweak {
        Tweak {
            id: "disable_telemetry_services".to_string(),
            title: "Disable Telemetry Services".to_string(),
            description: None,
            warning: None,
            category: "privacy".to_string(),
            one_time: false,
            actions: vec![
                Action::Registry(RegistryAction {
                    hive: Hive::HKLM,
                    key: TELEMETRY_KEY.to_string(),
                    name: "AllowTelemetry".to_string(),
                    data: RegistryData::Number(0),
                    data_type: RegistryDataType::REG_DWORD,
                }),
                Action::Service(ServiceAction {
                    name: "DiagTrack".to_string(),
                    state: "disabled".to_string(),
                }),
                Action::PowerPlan,
            ],
        }
    }

    #[test]
    fn test_missing_store_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = BackupStore::load(temp.path().join("undo_data.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_store_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("undo_data.json");
        fs::write(&path, "{ not json").unwrap();

        let err = BackupStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }

    #[test]
    fn test_snapshot_persists_capturable_states_only() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("undo_data.json");
        let (platform, _, shell) = memory_platform();
        shell.add_service("DiagTrack", 2);

        let mut store = BackupStore::load(&path).unwrap();
        assert!(store.snapshot(&telemetry_tweak(), &platform));

        let entry = store.get("disable_telemetry_services").unwrap();
        assert_eq!(entry.title, "Disable Telemetry Services");
        let kinds: Vec<&str> = entry.original_states.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, ["reg", "service"]);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"disable_telemetry_services\": {"));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let states = &json["disable_telemetry_services"]["original_states"];
        assert_eq!(states[0]["did_not_exist"], true);
        assert_eq!(states[1]["original_state"], "2");

        let reloaded = BackupStore::load(&path).unwrap();
        assert_eq!(reloaded.get("disable_telemetry_services"), Some(entry));
    }

    #[test]
    fn test_nothing_capturable_records_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("undo_data.json");
        let (platform, _, _) = memory_platform();

        let mut tweak = telemetry_tweak();
        tweak.actions = vec![Action::PowerPlan];

        let mut store = BackupStore::load(&path).unwrap();
        assert!(!store.snapshot(&tweak, &platform));
        assert!(!store.contains(&tweak.id));
        assert!(!path.exists());
    }

    #[test]
    fn test_failing_capture_is_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let (platform, _, shell) = failing_registry_platform("AllowTelemetry");
        shell.add_service("DiagTrack", 2);

        let mut store = BackupStore::load(temp.path().join("undo_data.json")).unwrap();
        assert!(store.snapshot(&telemetry_tweak(), &platform));
        let entry = store.get("disable_telemetry_services").unwrap();
        assert_eq!(entry.original_states.len(), 1);
        assert_eq!(entry.original_states[0].kind(), "service");
    }

    #[test]
    fn test_restore_without_entry_fails() {
        let temp = tempfile::tempdir().unwrap();
        let (platform, _, shell) = memory_platform();

        let mut store = BackupStore::load(temp.path().join("undo_data.json")).unwrap();
        let err = store.restore("disable_telemetry_services", &platform).unwrap_err();
        assert_eq!(err.to_string(), "No undo data for 'disable_telemetry_services'.");
        assert!(shell.commands().is_empty());
    }

    #[test]
    fn test_failed_restore_keeps_entry_for_retry() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("undo_data.json");
        let (platform, registry, shell) = memory_platform();
        shell.add_service("DiagTrack", 2);

        let tweak = telemetry_tweak();
        let mut store = BackupStore::load(&path).unwrap();
        store.snapshot(&tweak, &platform);
        for action in &tweak.actions {
            action.apply(&platform).unwrap();
        }

        let restore_service = "sc config \"DiagTrack\" start= auto";
        shell.fail_command(restore_service);
        assert!(store.restore(&tweak.id, &platform).is_err());
        assert!(store.contains(&tweak.id));
        // The registry step ran before the failing service step
        assert_eq!(
            registry
                .read_value(Hive::HKLM, TELEMETRY_KEY, "AllowTelemetry")
                .unwrap(),
            None
        );
        assert_eq!(shell.service_start_type("DiagTrack"), Some(4));
        assert!(BackupStore::load(&path).unwrap().contains(&tweak.id));

        // Retrying once the service can be changed finishes the restore
        shell.heal_command(restore_service);
        store.restore(&tweak.id, &platform).unwrap();
        assert!(!store.contains(&tweak.id));
        assert_eq!(shell.service_start_type("DiagTrack"), Some(2));
        assert!(!BackupStore::load(&path).unwrap().contains(&tweak.id));
    }

    #[test]
    fn test_successful_restore_removes_entry() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("undo_data.json");
        let (platform, registry, shell) = memory_platform();
        shell.add_service("DiagTrack", 2);
        registry
            .write_value(
                Hive::HKLM,
                TELEMETRY_KEY,
                "AllowTelemetry",
                &RegistryKeyValue::Dword(3),
            )
            .unwrap();

        let tweak = telemetry_tweak();
        let mut store = BackupStore::load(&path).unwrap();
        store.snapshot(&tweak, &platform);
        for action in &tweak.actions {
            action.apply(&platform).unwrap();
        }

        store.restore(&tweak.id, &platform).unwrap();
        assert!(!store.contains(&tweak.id));
        assert_eq!(
            registry
                .read_value(Hive::HKLM, TELEMETRY_KEY, "AllowTelemetry")
                .unwrap(),
            Some(RegistryKeyValue::Dword(3))
        );
        assert_eq!(shell.service_start_type("DiagTrack"), Some(2));
        assert!(BackupStore::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let temp = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail
        let path = temp.path().join("undo_data.json");
        fs::create_dir(&path).unwrap();
        let (platform, _, shell) = memory_platform();
        shell.add_service("DiagTrack", 2);

        let mut store = BackupStore {
            path,
            entries: IndexMap::new(),
        };
        assert!(store.snapshot(&telemetry_tweak(), &platform));
        assert!(store.contains("disable_telemetry_services"));
    }
}
