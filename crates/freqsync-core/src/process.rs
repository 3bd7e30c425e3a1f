//! External command execution.
//!
//! Restart commands are configured as shell strings (e.g.
//! `docker compose up -d`) and run through the platform shell with stdout
//! and stderr captured. [`CommandRunner`] is the seam the restarter uses so
//! tests can script command outcomes.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{Result, SyncError};

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code, or `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion. `Err` only when it could not be spawned.
    async fn run_command(&self, command: &str) -> Result<CommandOutput>;
}

/// Runs commands through `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    working_dir: Option<PathBuf>,
}

impl ShellRunner {
    pub fn new(working_dir: Option<&Path>) -> Self {
        Self {
            working_dir: working_dir.map(Path::to_path_buf),
        }
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run_command(&self, command: &str) -> Result<CommandOutput> {
        let mut cmd = shell_command(command);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| SyncError::Spawn {
            command: command.to_string(),
            message: e.to_string(),
        })?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
