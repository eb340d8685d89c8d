//! Local installation layout
//!
//! One directory per installed release under a host-supplied root.
//! Directory existence never implies completeness; callers probe
//! artifact by artifact. Missing paths are ordinary answers here, only
//! other filesystem failures become errors.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::Instant;
use tracing::debug;

const LOCK_FILE: &str = ".install.lock";
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Paths and filesystem primitives for the installation root
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one installed release
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// Full path of one artifact within a release
    pub fn artifact_path(&self, version: &str, file_name: &str) -> PathBuf {
        self.version_dir(version).join(file_name)
    }

    /// Whether the path exists at all
    ///
    /// `NotFound` is an ordinary `false`; every other failure propagates.
    pub async fn path_exists(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::filesystem(path, e)),
        }
    }

    /// Whether an artifact is installed at `path`
    ///
    /// A directory squatting on the artifact name counts as absent, since
    /// it could never be launched or read.
    pub async fn is_file_present(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::filesystem(path, e)),
        }
    }

    /// Create one directory level; already existing is success
    ///
    /// Deliberately non-recursive so a missing parent surfaces as an error
    /// instead of silently materializing a whole tree.
    pub async fn ensure_dir(&self, path: &Path) -> Result<()> {
        match fs::create_dir(path).await {
            Ok(()) => {
                debug!("created directory {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(Error::filesystem(path, e)),
        }
    }

    /// Take the advisory install lock, waiting up to `wait` for a holder
    /// to release it
    pub async fn acquire_lock(&self, wait: Duration) -> Result<InstallLock> {
        let lock_path = self.root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::filesystem(&lock_path, e))?;

        let deadline = Instant::now() + wait;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!("acquired install lock at {}", lock_path.display());
                    return Ok(InstallLock { file });
                }
                Err(e) if is_lock_contention(&e) => {
                    if Instant::now() >= deadline {
                        return Err(Error::Locked {
                            root: self.root.clone(),
                        });
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(e) => return Err(Error::filesystem(&lock_path, e)),
            }
        }
    }
}

fn is_lock_contention(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Guard for the advisory install lock
///
/// The lock is released when the guard is dropped; the lock file itself
/// is left in place for the next install.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
