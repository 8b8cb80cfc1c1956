//! Check runner port
//!
//! Runs one quality-check command and returns its captured output.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a command's result. Recorded as check status `error`,
/// never as `failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to spawn: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

#[async_trait]
pub trait CheckRunner: Send + Sync {
    /// Run `command`, killing it once `timeout` elapses.
    async fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput, CommandError>;
}
