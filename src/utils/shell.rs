// src/utils/shell.rs

use std::process::Command;

use anyhow::Context;

/// Captured result of one shell invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short description of a failed run for error messages.
    pub fn failure_summary(&self) -> String {
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        match self.code {
            Some(code) => format!("exit code {}: {}", code, detail),
            None => format!("terminated: {}", detail),
        }
    }
}

/// Runs command lines through the operating system shell.
pub trait CommandRunner: Send {
    /// Runs `command_line` to completion and captures its output. Only a
    /// failure to start the process is an error; a non-zero exit code is
    /// reported through [`CommandOutput::code`].
    fn run(&self, command_line: &str) -> anyhow::Result<CommandOutput>;
}

/// Runs commands through `cmd /C` without flashing a console window
/// (`sh -c` elsewhere).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl SystemShell {
    #[cfg(windows)]
    fn command(command_line: &str) -> Command {
        use std::os::windows::process::CommandExt;

        const CREATE_NO_WINDOW: u32 = 0x0800_0000;

        let mut command = Command::new("cmd");
        command
            .arg("/C")
            .raw_arg(command_line)
            .creation_flags(CREATE_NO_WINDOW);
        command
    }

    #[cfg(not(windows))]
    fn command(command_line: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_line);
        command
    }
}

impl CommandRunner for SystemShell {
    fn run(&self, command_line: &str) -> anyhow::Result<CommandOutput> {
        tracing::trace!("Running '{}'", command_line);
        let output = Self::command(command_line)
            .output()
            .with_context(|| format!("Failed to execute '{}'", command_line))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
