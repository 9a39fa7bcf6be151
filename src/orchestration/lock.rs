//! Cross-process lock around environment creation
//!
//! Two processes sharing a root directory may try to create the same
//! environment at once. The creator holds an exclusive advisory lock on
//! `<root>/<hash>.lock` from before the directory is created until the done
//! sentinel is written; everyone else waits, then re-reads the directory state.
//! The lock file lives beside the environment so rollback never removes it.

use crate::error::{SpackEnvError, SpackEnvResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Held lock, released on drop
#[derive(Debug)]
pub struct EnvLock {
    file: File,
    path: PathBuf,
}

impl EnvLock {
    /// Acquire the lock at `path`, waiting for any current holder
    pub async fn acquire(path: &Path) -> SpackEnvResult<Self> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(path))
            .await
            .map_err(|e| SpackEnvError::Internal(format!("lock task failed: {}", e)))?
    }

    fn acquire_blocking(path: PathBuf) -> SpackEnvResult<Self> {
        let lock_err = |source| SpackEnvError::Lock {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_err)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                info!(
                    "Waiting for another process to finish creating {}",
                    path.with_extension("").display()
                );
                file.lock_exclusive().map_err(lock_err)?;
            }
            Err(e) => return Err(lock_err(e)),
        }

        debug!("Acquired {}", path.display());
        Ok(Self { file, path })
    }

    /// Whether some other handle currently holds the lock at `path`.
    ///
    /// Never creates the lock file.
    pub fn is_held(path: &Path) -> bool {
        let Ok(file) = OpenOptions::new().read(true).open(path) else {
            return false;
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                false
            }
            Err(_) => true,
        }
    }
}

impl Drop for EnvLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released {}", self.path.display());
    }
}
