//! Timed execution of external tools.

use crate::project::ports::{BackendError, BackendResult};
use camino::Utf8Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs external commands with a fixed time budget.
///
/// Commands never read stdin and never prompt for credentials. A command
/// that exceeds the budget is killed.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    /// Creates a runner with the given time budget per command.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the time budget per command.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `program` in `cwd` and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::CommandFailed`] when the program cannot start
    /// or exits unsuccessfully, and [`BackendError::TimedOut`] when it runs
    /// past the budget.
    pub async fn run(&self, cwd: &Utf8Path, program: &str, args: &[&str]) -> BackendResult<String> {
        let command_line = render_command_line(program, args);
        debug!(%cwd, command = %command_line, "running external command");

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ASKPASS", "echo")
            .env("SSH_ASKPASS", "echo")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let Ok(spawned) = tokio::time::timeout(self.timeout, command.output()).await else {
            return Err(BackendError::TimedOut {
                command: command_line,
                timeout_secs: self.timeout.as_secs(),
            });
        };
        let output = spawned.map_err(|err| BackendError::CommandFailed {
            command: command_line.clone(),
            exit_code: -1,
            stderr: err.to_string(),
        })?;

        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                command: command_line,
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        String::from_utf8(output.stdout)
            .map_err(|err| BackendError::Parse(format!("{command_line}: {err}")))
    }
}

/// Renders a command line for logs and error messages.
#[must_use]
pub fn render_command_line(program: &str, args: &[&str]) -> String {
    let mut line = shell_escape(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_escape(arg));
    }
    line
}

/// Quotes a value for a POSIX shell when it contains anything beyond plain
/// word characters.
///
/// Uses single-quote wrapping and the standard `'\''` sequence for embedded
/// quotes.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ','));
    if plain {
        return value.to_owned();
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}
