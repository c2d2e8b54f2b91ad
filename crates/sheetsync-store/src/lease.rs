//! Same-host serialization of one working copy
//!
//! Processes on one host that share a cache directory take turns on it. The
//! lease is an exclusive advisory lock on a sibling `<dir>.lock` file, held
//! for as long as the `LocalLease` lives. The OS drops the lock when the
//! holder exits, crashed or not, so there is no stale-lease recovery.

use crate::errors::{io_error, Result};
use fs2::FileExt;
use sheetsync_core::SheetSyncError;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Longest a caller waits for the lease before giving up
pub const DEFAULT_LEASE_TIMEOUT: Duration = Duration::from_secs(600);

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct LocalLease {
    path: PathBuf,
    file: File,
}

impl LocalLease {
    /// `<dir>.lock`, next to the working directory
    pub fn lease_path(dir: &Path) -> PathBuf {
        let mut name = dir
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("cache"));
        name.push(".lock");
        dir.with_file_name(name)
    }

    pub fn acquire(dir: &Path) -> Result<Self> {
        Self::acquire_with(dir, DEFAULT_LEASE_TIMEOUT)
    }

    /// Poll for the lock until `timeout` has passed
    ///
    /// # Errors
    ///
    /// `LeaseTimeout` when another holder keeps the lock past `timeout`;
    /// I/O errors opening or locking the lease file.
    pub fn acquire_with(dir: &Path, timeout: Duration) -> Result<Self> {
        let path = Self::lease_path(dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_lease_dir", &e))?;
        }
        // The file is never removed: a waiter would otherwise lock an unlinked inode
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| io_error("open_lease", &e))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Lease acquired");
                    return Ok(Self { path, file });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if started.elapsed() >= timeout {
                        return Err(SheetSyncError::LeaseTimeout {
                            path: path.display().to_string(),
                            waited_secs: started.elapsed().as_secs(),
                        }
                        .into());
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(io_error("acquire_lease", &e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LocalLease {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!(path = %self.path.display(), error = %e, "Lease unlock failed");
        }
    }
}
