//! Shell-based check runner.

use async_trait::async_trait;
use squadforge_application::ports::check_runner::{CheckRunner, CommandError, CommandOutput};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs check commands through `sh -c`, optionally inside a working
/// directory. The child is killed when the timeout elapses.
#[derive(Debug, Clone, Default)]
pub struct ProcessCheckRunner {
    working_dir: Option<PathBuf>,
}

impl ProcessCheckRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CheckRunner for ProcessCheckRunner {
    async fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput, CommandError> {
        if let Some(dir) = &self.working_dir
            && !dir.is_dir()
        {
            return Err(CommandError::Spawn(format!(
                "working directory does not exist: {}",
                dir.display()
            )));
        }

        debug!("Running check command: {}", command);
        let child = self
            .command(command)
            .spawn()
            .map_err(|e| CommandError::Spawn(e.to_string()))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(CommandError::Io(e.to_string())),
            Err(_) => {
                warn!("Check command timed out after {:?}: {}", timeout, command);
                return Err(CommandError::Timeout(timeout));
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = ProcessCheckRunner::new();
        let output = runner
            .run("echo out; echo err >&2; exit 3", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let runner = ProcessCheckRunner::new().with_working_dir(dir.path());
        let output = runner
            .run("ls marker.txt", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_error() {
        let runner = ProcessCheckRunner::new();
        let err = runner
            .run("sleep 5", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::Timeout(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_missing_working_dir_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessCheckRunner::new().with_working_dir(dir.path().join("missing"));
        let err = runner.run("true", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn(_)));
    }
}
