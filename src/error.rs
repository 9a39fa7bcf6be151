//! Error types for spackenv
//!
//! All modules use `SpackEnvResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spackenv operations
pub type SpackEnvResult<T> = Result<T, SpackEnvError>;

/// All errors that can occur in spackenv
#[derive(Error, Debug)]
pub enum SpackEnvError {
    // Provisioning errors
    #[error("Could not read environment specification {source_ref}: {reason}")]
    SourceUnavailable { source_ref: String, reason: String },

    #[error("The '{name}' command is not available in the shell {shell} that will be used. Ensure it is in your PATH.")]
    ToolNotFound { name: String, shell: String },

    #[error("Environment at {0} is incomplete: a previous setup was interrupted")]
    BrokenEnvironment(PathBuf),

    #[error("Could not create spack environment from {spec}:\n{output}")]
    ProvisioningFailed { spec: String, output: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid environment source '{0}'")]
    SourceInvalid(String),

    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with code {code}: {command}")]
    CommandExit {
        command: String,
        code: i32,
        output: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpackEnvError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(source_ref: impl ToString, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_ref: source_ref.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolNotFound { .. } => {
                Some("Source spack's setup-env.sh in your shell profile, or set tool.executable")
            }
            Self::BrokenEnvironment(_) => {
                Some("Re-run with --repair to remove the incomplete environment and recreate it")
            }
            Self::UnsupportedOperation(_) => {
                Some("Keep the spack.yaml under version control to reproduce the environment")
            }
            Self::SourceInvalid(_) => Some("Use a path, an http(s):// URL or git+<repo>@<rev>:<path>"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SpackEnvError::ToolNotFound {
            name: "spack".to_string(),
            shell: "/bin/sh".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'spack'"));
        assert!(msg.contains("/bin/sh"));
    }

    #[test]
    fn provisioning_failed_keeps_output_verbatim() {
        let err = SpackEnvError::ProvisioningFailed {
            spec: "envs/zlib.yaml".to_string(),
            output: "==> Error: zlib: no such package\n  trailing".to_string(),
        };
        assert!(err
            .to_string()
            .ends_with("==> Error: zlib: no such package\n  trailing"));
    }

    #[test]
    fn error_hint() {
        let err = SpackEnvError::BrokenEnvironment(PathBuf::from("/cache/envs/abc"));
        assert!(err.hint().unwrap().contains("--repair"));
        assert_eq!(SpackEnvError::Internal("x".to_string()).hint(), None);
    }
}
