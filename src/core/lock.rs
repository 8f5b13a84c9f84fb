//! Exclusive lock guarding the ledger against concurrent invocations.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{FinblogError, Result};

/// Held for the lifetime of a mutating command; released on drop
#[derive(Debug)]
pub struct LedgerLock {
    file: File,
    path: PathBuf,
}

impl LedgerLock {
    /// Take the lock without waiting, failing fast if another process holds it
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FinblogError::write(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| FinblogError::write(&path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| FinblogError::Lock(path.clone()))?;

        debug!(path = %path.display(), "Acquired ledger lock");
        Ok(Self { file, path })
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "Released ledger lock");
    }
}
