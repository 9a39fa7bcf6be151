//! Tool availability checks

use crate::error::{SpackEnvError, SpackEnvResult};
use crate::orchestration::shell_quote;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Finds executables in the environment commands will run in
#[async_trait]
pub trait ToolLocator: Send + Sync {
    /// Resolve `name`, failing with `ToolNotFound`
    async fn find_executable(&self, name: &str) -> SpackEnvResult<PathBuf>;
}

/// Locator asking the invocation shell itself.
///
/// Uses `command -v`, so shell functions (spack's `setup-env.sh` defines
/// `spack` as one) count as available, not just binaries on `PATH`.
#[derive(Debug, Clone)]
pub struct ShellLocator {
    shell: String,
}

impl ShellLocator {
    /// Create a locator for the given shell
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellLocator {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

#[async_trait]
impl ToolLocator for ShellLocator {
    async fn find_executable(&self, name: &str) -> SpackEnvResult<PathBuf> {
        let check = format!("command -v {}", shell_quote(name));
        debug!("Locating {} with: {} -c {:?}", name, self.shell, check);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&check)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| SpackEnvError::command_failed(format!("{} -c {}", self.shell, check), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let found = stdout.lines().next().map(str::trim).unwrap_or_default();

        if output.status.success() && !found.is_empty() {
            debug!("Found {} at {}", name, found);
            Ok(PathBuf::from(found))
        } else {
            Err(SpackEnvError::ToolNotFound {
                name: name.to_string(),
                shell: self.shell.clone(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_shell_builtin_tools() {
        let locator = ShellLocator::default();
        let path = locator.find_executable("sh").await.unwrap();
        assert!(path.to_string_lossy().ends_with("sh"));
    }

    #[tokio::test]
    async fn missing_tool_names_shell() {
        let locator = ShellLocator::new("/bin/sh");
        let err = locator
            .find_executable("spackenv-definitely-missing-tool")
            .await
            .unwrap_err();

        match err {
            SpackEnvError::ToolNotFound { name, shell } => {
                assert_eq!(name, "spackenv-definitely-missing-tool");
                assert_eq!(shell, "/bin/sh");
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }
}
