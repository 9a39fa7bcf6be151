//! Spack command lines

use crate::config::CleanupMode;
use crate::orchestration::shell_quote;
use std::path::Path;

/// Builder for the spack invocations used during provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spack {
    executable: String,
}

impl Spack {
    /// Create a builder for the given executable name or path
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Executable name or path
    pub fn executable(&self) -> &str {
        &self.executable
    }

    fn exe(&self) -> String {
        shell_quote(&self.executable)
    }

    /// `spack env create --dir <env> <manifest>`
    pub fn env_create(&self, env_path: &Path, manifest: &Path) -> String {
        format!(
            "{} env create --dir {} {}",
            self.exe(),
            shell_quote(&env_path.to_string_lossy()),
            shell_quote(&manifest.to_string_lossy())
        )
    }

    /// Shell snippet activating the environment at `env_path`
    pub fn activate(&self, env_path: &Path) -> String {
        format!(
            "eval \"$({} env activate --sh {})\"",
            self.exe(),
            shell_quote(&env_path.to_string_lossy())
        )
    }

    /// Prefix `cmd` with the environment's activation
    pub fn shell_command(&self, env_path: &Path, cmd: &str) -> String {
        format!("{}; {}", self.activate(env_path), cmd)
    }

    /// Concretize and install inside the activated environment
    pub fn install(&self, env_path: &Path) -> String {
        self.shell_command(env_path, &format!("{} install", self.exe()))
    }

    /// Housekeeping for one cleanup mode
    pub fn clean(&self, mode: CleanupMode) -> String {
        format!("{} clean {}", self.exe(), mode.clean_flag())
    }
}

impl Default for Spack {
    fn default() -> Self {
        Self::new("spack")
    }
}
