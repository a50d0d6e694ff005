//! Per-title run lock
//!
//! A lock file next to the archive marks a title as busy. It is created exclusively and
//! removed when the guard drops. A crash leaves the file behind; it has to be removed by
//! hand after checking no run is active.

use crate::HoardError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Guard holding the lock for one title
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquires the lock for `title` inside `dir`
    ///
    /// # Returns
    ///
    /// * `Ok(RunLock)` - The lock is held until the guard drops
    /// * `Err(HoardError::RunInProgress)` - Another run holds the lock
    pub fn acquire(dir: &Path, title: &str) -> Result<Self, HoardError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.lock", title));

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                tracing::debug!("Acquired run lock {}", path.display());
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(HoardError::RunInProgress {
                title: title.to_string(),
                lock_path: path,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove run lock {}: {}", self.path.display(), e);
        }
    }
}
