//! Shell command execution
//!
//! Runs command lines through a shell with stderr folded into stdout, the way
//! an interactive user would see the tool's output.

use crate::error::{SpackEnvError, SpackEnvResult};
use crate::orchestration::collect_child_output;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// Runs a command line and returns its combined stdout/stderr
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run `command_line` to completion.
    ///
    /// A non-zero exit is reported as `CommandExit` carrying the output.
    async fn run(&self, command_line: &str) -> SpackEnvResult<String>;
}

/// Callback receiving each output line as it is produced
pub type OutputListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Executor spawning `<shell> -c <command line>`
#[derive(Clone)]
pub struct ShellExecutor {
    shell: String,
    listener: Option<OutputListener>,
}

impl ShellExecutor {
    /// Create an executor using the given shell
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            listener: None,
        }
    }

    /// Forward every output line to `listener` (e.g. a progress spinner)
    pub fn with_listener(mut self, listener: OutputListener) -> Self {
        self.listener = Some(listener);
        self
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl fmt::Debug for ShellExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellExecutor")
            .field("shell", &self.shell)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

#[async_trait]
impl ProcessExecutor for ShellExecutor {
    async fn run(&self, command_line: &str) -> SpackEnvResult<String> {
        debug!("Executing: {} -c {:?}", self.shell, command_line);

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(format!("exec 2>&1; {}", command_line))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpackEnvError::command_failed(command_line, e))?;

        let on_line = |line: &str| {
            debug!("{}", line);
            if let Some(ref listener) = self.listener {
                listener(line);
            }
        };
        let output = collect_child_output(&mut child, &on_line).await;

        let status = child
            .wait()
            .await
            .map_err(|e| SpackEnvError::command_failed(command_line, e))?;
        let output = String::from_utf8_lossy(&output).into_owned();

        if status.success() {
            Ok(output)
        } else {
            Err(SpackEnvError::CommandExit {
                command: command_line.to_string(),
                code: status.code().unwrap_or(-1),
                output,
            })
        }
    }
}
