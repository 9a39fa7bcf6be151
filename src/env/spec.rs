//! Environment specification identity
//!
//! An `EnvironmentSpec` is an immutable value: its content and hashes are
//! computed at most once and never change for the lifetime of the object.

use crate::env::instance::EnvironmentInstance;
use crate::error::{SpackEnvError, SpackEnvResult};
use crate::source::{SourceReader, SourceRef};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// A specification file bound to the root directory its environment lives in
pub struct EnvironmentSpec {
    source: SourceRef,
    target_root: PathBuf,
    reader: Arc<dyn SourceReader>,
    content: OnceCell<Vec<u8>>,
    content_hash: OnceCell<String>,
    identity_hash: OnceCell<String>,
}

impl EnvironmentSpec {
    /// Create a spec whose content is fetched lazily through `reader`
    pub fn new(
        source: SourceRef,
        target_root: impl Into<PathBuf>,
        reader: Arc<dyn SourceReader>,
    ) -> Self {
        Self {
            source,
            target_root: target_root.into(),
            reader,
            content: OnceCell::new(),
            content_hash: OnceCell::new(),
            identity_hash: OnceCell::new(),
        }
    }

    /// Create a spec with content that is already in memory
    pub fn from_content(
        source: SourceRef,
        target_root: impl Into<PathBuf>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            content: OnceCell::new_with(Some(content)),
            ..Self::new(
                source,
                target_root,
                Arc::new(crate::source::DefaultSourceReader::new()),
            )
        }
    }

    /// Declared source of the specification
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Root directory under which the environment is stored
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Raw specification bytes, read once
    pub async fn content(&self) -> SpackEnvResult<&[u8]> {
        let content = self
            .content
            .get_or_try_init(|| async {
                debug!("Reading environment specification {}", self.source);
                self.reader.read(&self.source).await
            })
            .await?;
        Ok(content.as_slice())
    }

    /// SHA256 of the content alone
    pub async fn content_hash(&self) -> SpackEnvResult<&str> {
        let content = self.content().await?;
        let hash = self
            .content_hash
            .get_or_init(|| async { hex::encode(Sha256::digest(content)) })
            .await;
        Ok(hash.as_str())
    }

    /// SHA256 over the canonical target root followed by the content.
    ///
    /// Including the absolute root means relocating the root directory
    /// yields new hashes, so environments with baked-in absolute paths are
    /// never reused from a different location.
    pub async fn identity_hash(&self) -> SpackEnvResult<&str> {
        let content = self.content().await?;
        let hash = self
            .identity_hash
            .get_or_try_init(|| async {
                let root = canonical_root(&self.target_root).map_err(|e| {
                    SpackEnvError::io(
                        format!("resolving environment root {}", self.target_root.display()),
                        e,
                    )
                })?;

                let mut hasher = Sha256::new();
                hasher.update(root.as_os_str().as_encoded_bytes());
                hasher.update(content);
                Ok::<_, SpackEnvError>(hex::encode(hasher.finalize()))
            })
            .await?;
        Ok(hash.as_str())
    }

    /// Resolve the environment directory against the current filesystem
    pub async fn resolve(&self) -> SpackEnvResult<EnvironmentInstance> {
        let hash = self.identity_hash().await?;
        Ok(EnvironmentInstance::resolve(&self.target_root, hash))
    }

    /// Path of the environment directory (not cached, see [`EnvironmentInstance::resolve`])
    pub async fn resolve_path(&self) -> SpackEnvResult<PathBuf> {
        Ok(self.resolve().await?.path)
    }
}

impl PartialEq for EnvironmentSpec {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for EnvironmentSpec {}

impl fmt::Debug for EnvironmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentSpec")
            .field("source", &self.source)
            .field("target_root", &self.target_root)
            .field("identity_hash", &self.identity_hash.get())
            .finish_non_exhaustive()
    }
}

/// Absolute, symlink-resolved form of `root`.
///
/// The root does not have to exist: the deepest existing ancestor is resolved
/// and the remaining components are appended unchanged.
pub fn canonical_root(root: &Path) -> std::io::Result<PathBuf> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };
    let normalized = normalize_lexically(&absolute);

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            for name in missing.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(normalized),
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
