// src/testing.rs

//! Scripted stand-ins for the shell and registry, shared by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{bail, Result};

use crate::utils::{
    registry::{Hive, RegistryAccess, RegistryKeyValue},
    shell::{CommandOutput, CommandRunner},
    Platform,
};

const BALANCED_GUID: &str = "381b4222-f694-41f0-9685-ff5bb260df2e";

/// A platform over an empty in-memory registry and a [`FakeShell`], plus
/// handles to both for arranging and inspecting state.
pub fn memory_platform() -> (Platform, MemoryRegistry, FakeShell) {
    let registry = MemoryRegistry::new();
    let shell = FakeShell::new();
    let platform = Platform::new(Box::new(registry.clone()), Box::new(shell.clone()));
    (platform, registry, shell)
}

type KeyValues = HashMap<String, RegistryKeyValue>;

/// In-memory registry. Key paths and value names are case-insensitive, as
/// they are in the real registry. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    keys: Arc<Mutex<HashMap<(Hive, String), KeyValues>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_exists(&self, hive: Hive, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(hive, key.to_lowercase()))
    }
}

impl RegistryAccess for MemoryRegistry {
    fn read_value(&self, hive: Hive, key: &str, name: &str) -> Result<Option<RegistryKeyValue>> {
        let keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .get(&(hive, key.to_lowercase()))
            .and_then(|values| values.get(&name.to_lowercase()))
            .cloned())
    }

    fn write_value(
        &self,
        hive: Hive,
        key: &str,
        name: &str,
        value: &RegistryKeyValue,
    ) -> Result<()> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.entry((hive, key.to_lowercase()))
            .or_default()
            .insert(name.to_lowercase(), value.clone());
        Ok(())
    }

    fn delete_value(&self, hive: Hive, key: &str, name: &str) -> Result<()> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(values) = keys.get_mut(&(hive, key.to_lowercase())) {
            values.remove(&name.to_lowercase());
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ShellState {
    services: HashMap<String, u32>,
    tasks: HashMap<String, bool>,
    schemes: HashMap<String, String>,
    active_scheme: String,
    failing: HashSet<String>,
    commands: Vec<String>,
}

/// Emulates the handful of `sc`, `schtasks` and `powercfg` invocations the
/// tweak actions issue. Any other command line succeeds with no output.
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct FakeShell {
    state: Arc<Mutex<ShellState>>,
}

impl FakeShell {
    pub fn new() -> Self {
        let mut schemes = HashMap::new();
        schemes.insert(BALANCED_GUID.to_string(), "Balanced".to_string());
        Self {
            state: Arc::new(Mutex::new(ShellState {
                services: HashMap::new(),
                tasks: HashMap::new(),
                schemes,
                active_scheme: BALANCED_GUID.to_string(),
                failing: HashSet::new(),
                commands: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_service(&self, name: &str, start_type: u32) {
        self.state().services.insert(name.to_string(), start_type);
    }

    pub fn service_start_type(&self, name: &str) -> Option<u32> {
        self.state().services.get(name).copied()
    }

    pub fn add_task(&self, name: &str, enabled: bool) {
        self.state().tasks.insert(name.to_string(), enabled);
    }

    pub fn task_enabled(&self, name: &str) -> Option<bool> {
        self.state().tasks.get(name).copied()
    }

    pub fn power_scheme_name(&self, guid: &str) -> Option<String> {
        self.state().schemes.get(guid).cloned()
    }

    pub fn active_power_scheme(&self) -> String {
        self.state().active_scheme.clone()
    }

    /// Makes `command_line` exit with code 1 from now on.
    pub fn fail_command(&self, command_line: &str) {
        self.state().failing.insert(command_line.to_string());
    }

    /// Lets `command_line` run normally again.
    pub fn heal_command(&self, command_line: &str) {
        self.state().failing.remove(command_line);
    }

    /// Every command line run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn failed(code: i32, message: impl Into<String>) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: message.into(),
        stderr: String::new(),
    }
}

/// The first double-quoted argument of a command line.
fn quoted(command_line: &str) -> Option<&str> {
    command_line.split('"').nth(1)
}

fn service_mode_code(mode: &str) -> Option<u32> {
    match mode {
        "boot" => Some(0),
        "system" => Some(1),
        "auto" | "delayed-auto" => Some(2),
        "demand" => Some(3),
        "disabled" => Some(4),
        _ => None,
    }
}

fn service_mode_label(code: u32) -> &'static str {
    match code {
        0 => "BOOT_START",
        1 => "SYSTEM_START",
        2 => "AUTO_START",
        4 => "DISABLED",
        _ => "DEMAND_START",
    }
}

const SERVICE_MISSING: &str =
    "[SC] OpenService FAILED 1060:\r\n\r\nThe specified service does not exist as an installed service.\r\n";

impl ShellState {
    fn sc(&mut self, command_line: &str) -> CommandOutput {
        let Some(name) = quoted(command_line) else {
            return failed(1639, "[SC] invalid command line");
        };
        let Some(current) = self.services.get(name).copied() else {
            return failed(1060, SERVICE_MISSING);
        };

        if command_line.starts_with("sc qc ") {
            return ok(format!(
                "[SC] QueryServiceConfig SUCCESS\r\n\r\nSERVICE_NAME: {name}\r\n        TYPE               : 10  WIN32_OWN_PROCESS\r\n        START_TYPE         : {current}   {}\r\n        ERROR_CONTROL      : 1   NORMAL\r\n",
                service_mode_label(current)
            ));
        }

        let mode = command_line
            .split_once("start= ")
            .map(|(_, mode)| mode.trim());
        match mode.and_then(service_mode_code) {
            Some(code) => {
                self.services.insert(name.to_string(), code);
                ok("[SC] ChangeServiceConfig SUCCESS\r\n")
            }
            None => failed(1639, "[SC] invalid start mode"),
        }
    }

    fn schtasks(&mut self, command_line: &str) -> CommandOutput {
        let Some(name) = quoted(command_line) else {
            return failed(1, "ERROR: Invalid syntax.");
        };
        let Some(enabled) = self.tasks.get(name).copied() else {
            return CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "ERROR: The system cannot find the file specified.\r\n".to_string(),
            };
        };

        if command_line.starts_with("schtasks /query ") {
            let leaf = name.rsplit('\\').next().unwrap_or(name);
            let status = if enabled { "Ready" } else { "Disabled" };
            return ok(format!(
                "\r\nFolder: \\\r\nTaskName                                 Next Run Time          Status\r\n======================================== ====================== ===============\r\n{leaf:<40} N/A                    {status}\r\n"
            ));
        }

        if command_line.ends_with("/enable") {
            self.tasks.insert(name.to_string(), true);
        } else if command_line.ends_with("/disable") {
            self.tasks.insert(name.to_string(), false);
        } else {
            return failed(1, "ERROR: Invalid argument/option.");
        }
        ok(format!(
            "SUCCESS: The parameters of scheduled task \"{name}\" have been changed.\r\n"
        ))
    }

    fn powercfg(&mut self, command_line: &str) -> CommandOutput {
        let args: Vec<&str> = command_line.split_whitespace().skip(1).collect();
        let invalid = || failed(1, "Invalid Parameters -- try \"/?\" for help");

        match args.first().copied() {
            Some("/getactivescheme") => {
                let name = self
                    .schemes
                    .get(&self.active_scheme)
                    .cloned()
                    .unwrap_or_default();
                ok(format!(
                    "Power Scheme GUID: {}  ({})\r\n",
                    self.active_scheme, name
                ))
            }
            Some("/duplicatescheme") => {
                let (Some(base), Some(guid)) = (args.get(1), args.get(2)) else {
                    return invalid();
                };
                if self.schemes.contains_key(*guid) {
                    return invalid();
                }
                self.schemes
                    .insert(guid.to_string(), format!("Copy of {base}"));
                ok(format!("Power Scheme GUID: {guid}  (High performance)\r\n"))
            }
            Some("/changename") => {
                let (Some(guid), Some(name)) = (args.get(1), quoted(command_line)) else {
                    return invalid();
                };
                match self.schemes.get_mut(*guid) {
                    Some(existing) => {
                        *existing = name.to_string();
                        ok("")
                    }
                    None => invalid(),
                }
            }
            Some("/setactive") => match args.get(1) {
                Some(guid) if self.schemes.contains_key(*guid) => {
                    self.active_scheme = guid.to_string();
                    ok("")
                }
                _ => invalid(),
            },
            _ => invalid(),
        }
    }
}

impl CommandRunner for FakeShell {
    fn run(&self, command_line: &str) -> Result<CommandOutput> {
        let mut state = self.state();
        state.commands.push(command_line.to_string());

        if state.failing.contains(command_line) {
            return Ok(failed(1, format!("'{command_line}' failed")));
        }
        let output = if command_line.starts_with("sc ") {
            state.sc(command_line)
        } else if command_line.starts_with("schtasks ") {
            state.schtasks(command_line)
        } else if command_line.starts_with("powercfg ") {
            state.powercfg(command_line)
        } else {
            ok("")
        };
        Ok(output)
    }
}

/// Wraps a [`MemoryRegistry`], failing every access to one value name.
#[derive(Debug, Clone)]
pub struct FailingRegistry {
    pub inner: MemoryRegistry,
    pub value_name: String,
}

impl FailingRegistry {
    fn check(&self, name: &str) -> Result<()> {
        if name.eq_ignore_ascii_case(&self.value_name) {
            bail!("Access is denied. (os error 5)");
        }
        Ok(())
    }
}

impl RegistryAccess for FailingRegistry {
    fn read_value(&self, hive: Hive, key: &str, name: &str) -> Result<Option<RegistryKeyValue>> {
        self.check(name)?;
        self.inner.read_value(hive, key, name)
    }

    fn write_value(
        &self,
        hive: Hive,
        key: &str,
        name: &str,
        value: &RegistryKeyValue,
    ) -> Result<()> {
        self.check(name)?;
        self.inner.write_value(hive, key, name, value)
    }

    fn delete_value(&self, hive: Hive, key: &str, name: &str) -> Result<()> {
        self.check(name)?;
        self.inner.delete_value(hive, key, name)
    }
}

/// Like [`memory_platform`], but every access to `value_name` fails.
pub fn failing_registry_platform(value_name: &str) -> (Platform, MemoryRegistry, FakeShell) {
    let registry = MemoryRegistry::new();
    let shell = FakeShell::new();
    let failing = FailingRegistry {
        inner: registry.clone(),
        value_name: value_name.to_string(),
    };
    let platform = Platform::new(Box::new(failing), Box::new(shell.clone()));
    (platform, registry, shell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRO_POWER_PLAN_GUID;

    const TEST_KEY: &str = "Software\\TweakUtilityTest";

    #[test]
    fn test_memory_registry_create_modify_read_delete() {
        let registry = MemoryRegistry::new();
        assert_eq!(registry.read_value(Hive::HKCU, TEST_KEY, "TestDword").unwrap(), None);

        registry
            .write_value(Hive::HKCU, TEST_KEY, "TestDword", &RegistryKeyValue::Dword(1))
            .unwrap();
        registry
            .write_value(Hive::HKCU, TEST_KEY, "testdword", &RegistryKeyValue::Dword(2))
            .unwrap();
        assert_eq!(
            registry.read_value(Hive::HKCU, TEST_KEY, "TestDword").unwrap(),
            Some(RegistryKeyValue::Dword(2))
        );

        registry.delete_value(Hive::HKCU, TEST_KEY, "TestDword").unwrap();
        assert_eq!(registry.read_value(Hive::HKCU, TEST_KEY, "TestDword").unwrap(), None);
        assert!(registry.key_exists(Hive::HKCU, TEST_KEY));

        // Deleting from a key that was never created is not an error
        registry.delete_value(Hive::HKLM, TEST_KEY, "Missing").unwrap();
    }

    #[test]
    fn test_fake_shell_power_scheme_lifecycle() {
        let shell = FakeShell::new();
        let dup = format!("powercfg /duplicatescheme base {PRO_POWER_PLAN_GUID}");
        assert!(shell.run(&dup).unwrap().success());
        assert!(!shell.run(&dup).unwrap().success());
        assert!(shell
            .run(&format!("powercfg /setactive {PRO_POWER_PLAN_GUID}"))
            .unwrap()
            .success());
        assert_eq!(shell.active_power_scheme(), PRO_POWER_PLAN_GUID);
    }
}
