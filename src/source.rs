//! Environment specification sources
//!
//! A specification can come from a local file, a blob at a given revision of a
//! git repository, or a remote URL. Two sources are the same environment
//! source only if they name the same location, even when their content is
//! byte-identical.

use crate::error::{SpackEnvError, SpackEnvResult};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tracing::debug;

/// Declared location of a specification file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    /// File on the local filesystem
    Local(PathBuf),

    /// Blob `path` at revision `rev` of the git repository at `repo`
    Git {
        repo: PathBuf,
        rev: String,
        path: String,
    },

    /// `http://` or `https://` URL
    Remote(String),
}

impl SourceRef {
    /// Short, human-readable name used in progress lines
    pub fn simplify(&self) -> String {
        match self {
            Self::Local(path) => std::env::current_dir()
                .ok()
                .and_then(|cwd| path.strip_prefix(cwd).ok().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| path.clone())
                .display()
                .to_string(),
            other => other.to_string(),
        }
    }
}

impl FromStr for SourceRef {
    type Err = SpackEnvError;

    /// Parse `git+<repo>@<rev>:<path>`, `http(s)://...` or a plain path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SpackEnvError::SourceInvalid(s.to_string()));
        }

        if let Some(rest) = s.strip_prefix("git+") {
            let invalid = || SpackEnvError::SourceInvalid(s.to_string());
            // Git revisions never contain ':', so the first ':' after an '@'
            // ends the revision; the path after it may contain anything
            let at = rest.find('@').ok_or_else(invalid)?;
            let colon = rest[at..].find(':').map(|i| at + i).ok_or_else(invalid)?;
            let (repo, rev) = rest[..colon].rsplit_once('@').ok_or_else(invalid)?;
            let path = &rest[colon + 1..];
            if repo.is_empty() || rev.is_empty() || path.is_empty() {
                return Err(SpackEnvError::SourceInvalid(s.to_string()));
            }
            return Ok(Self::Git {
                repo: PathBuf::from(repo),
                rev: rev.to_string(),
                path: path.to_string(),
            });
        }

        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Remote(s.to_string()));
        }

        Ok(Self::Local(PathBuf::from(s)))
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Git { repo, rev, path } => {
                write!(f, "git+{}@{}:{}", repo.display(), rev, path)
            }
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Reads raw specification bytes from a source
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Fetch the full content, failing with `SourceUnavailable`
    async fn read(&self, source: &SourceRef) -> SpackEnvResult<Vec<u8>>;
}

/// Reader for local files, git blobs and remote URLs
#[derive(Debug, Clone)]
pub struct DefaultSourceReader {
    git: String,
}

impl DefaultSourceReader {
    /// Create a reader using `git` from `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable for `git+` sources
    pub fn with_git(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    async fn read_git(&self, repo: &Path, rev: &str, path: &str) -> SpackEnvResult<Vec<u8>> {
        let object = format!("{}:{}", rev, path);
        let source_ref = format!("git+{}@{}", repo.display(), object);
        debug!("Reading git blob {} from {}", object, repo.display());

        let output = Command::new(&self.git)
            .arg("-C")
            .arg(repo)
            .args(["show", &object])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                SpackEnvError::source_unavailable(
                    &source_ref,
                    format!("could not run {}: {}", self.git, e),
                )
            })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(SpackEnvError::source_unavailable(
                source_ref,
                String::from_utf8_lossy(&output.stderr).trim(),
            ))
        }
    }

    async fn read_remote(url: &str) -> SpackEnvResult<Vec<u8>> {
        debug!("Downloading {}", url);

        let owned = url.to_string();
        let result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ureq::Error> {
            let mut response = ureq::get(&owned).call()?;
            response.body_mut().read_to_vec()
        })
        .await
        .map_err(|e| {
            SpackEnvError::source_unavailable(url, format!("download task failed: {}", e))
        })?;

        result.map_err(|e| SpackEnvError::source_unavailable(url, e))
    }
}

impl Default for DefaultSourceReader {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
        }
    }
}

#[async_trait]
impl SourceReader for DefaultSourceReader {
    async fn read(&self, source: &SourceRef) -> SpackEnvResult<Vec<u8>> {
        match source {
            SourceRef::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| SpackEnvError::source_unavailable(path.display(), e)),
            SourceRef::Git { repo, rev, path } => self.read_git(repo, rev, path).await,
            SourceRef::Remote(url) => Self::read_remote(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_local() {
        let source: SourceRef = "envs/zlib.yaml".parse().unwrap();
        assert_eq!(source, SourceRef::Local(PathBuf::from("envs/zlib.yaml")));
    }

    #[test]
    fn parse_remote() {
        let source: SourceRef = "https://example.org/spack.yaml".parse().unwrap();
        assert_eq!(
            source,
            SourceRef::Remote("https://example.org/spack.yaml".to_string())
        );
    }

    #[test]
    fn parse_git() {
        let source: SourceRef = "git+/srv/repo@v1.2:envs/spack.yaml".parse().unwrap();
        assert_eq!(
            source,
            SourceRef::Git {
                repo: PathBuf::from("/srv/repo"),
                rev: "v1.2".to_string(),
                path: "envs/spack.yaml".to_string(),
            }
        );
        assert_eq!(source.to_string(), "git+/srv/repo@v1.2:envs/spack.yaml");
    }

    #[test]
    fn parse_git_path_with_at_sign() {
        let source: SourceRef = "git+/home/u@x/repo@v1:envs/a@b.yaml".parse().unwrap();
        assert_eq!(
            source,
            SourceRef::Git {
                repo: PathBuf::from("/home/u@x/repo"),
                rev: "v1".to_string(),
                path: "envs/a@b.yaml".to_string(),
            }
        );
    }

    #[test]
    fn parse_git_malformed() {
        assert!("git+/srv/repo".parse::<SourceRef>().is_err());
        assert!("git+/srv/repo@v1".parse::<SourceRef>().is_err());
        assert!("git+@v1:a.yaml".parse::<SourceRef>().is_err());
        assert!("".parse::<SourceRef>().is_err());
    }

    #[tokio::test]
    async fn read_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spack.yaml");
        std::fs::write(&path, b"spack:\n  specs: [zlib]\n").unwrap();

        let content = DefaultSourceReader::new()
            .read(&SourceRef::Local(path))
            .await
            .unwrap();
        assert_eq!(content, b"spack:\n  specs: [zlib]\n");
    }

    #[tokio::test]
    async fn read_missing_file_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = DefaultSourceReader::new()
            .read(&SourceRef::Local(dir.path().join("missing.yaml")))
            .await
            .unwrap_err();
        assert!(matches!(err, SpackEnvError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn missing_git_is_source_unavailable() {
        let source: SourceRef = "git+/srv/repo@v1:spack.yaml".parse().unwrap();
        let err = DefaultSourceReader::new()
            .with_git("/nonexistent/bin/git")
            .read(&source)
            .await
            .unwrap_err();

        match err {
            SpackEnvError::SourceUnavailable { source_ref, reason } => {
                assert_eq!(source_ref, "git+/srv/repo@v1:spack.yaml");
                assert!(reason.contains("/nonexistent/bin/git"));
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }
}
