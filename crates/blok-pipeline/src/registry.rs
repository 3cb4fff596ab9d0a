//! Exclusive leases on destination directories.
//!
//! Within a process the registry keeps a set of held roots. With a lock
//! directory it also takes an OS lock on `<lock dir>/<run key>.lock`, so
//! separate `blok` processes working on one root exclude each other too.
//! The lock goes away with the process; lock files themselves are left in
//! place and reused.

use crate::error::PipelineError;
use crate::store::run_key;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Tracks which destinations have a run in progress.
///
/// One registry is shared by every run in a process; clones share state.
#[derive(Debug, Clone, Default)]
pub struct DestinationRegistry {
    held: Arc<Mutex<HashSet<PathBuf>>>,
    lock_dir: Option<PathBuf>,
}

impl DestinationRegistry {
    /// In-process leases only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Leases that also hold a lock file under `dir`.
    pub fn with_lock_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            held: Arc::default(),
            lock_dir: Some(dir.into()),
        }
    }

    /// Take the lease for `path`, failing fast if it is already held.
    pub fn acquire(&self, path: &Path) -> Result<DestinationLease, PipelineError> {
        let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        {
            let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
            if !held.insert(key.clone()) {
                return Err(PipelineError::DestinationBusy(key));
            }
        }

        let lock = match &self.lock_dir {
            Some(dir) => match lock_file(dir, &key) {
                Ok(file) => Some(file),
                Err(e) => {
                    self.release(&key);
                    return Err(e);
                }
            },
            None => None,
        };

        tracing::debug!(destination = %key.display(), "Destination lease acquired");
        Ok(DestinationLease {
            held: self.held.clone(),
            path: key,
            _lock: lock,
        })
    }

    pub fn is_held(&self, path: &Path) -> bool {
        let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key)
    }

    fn release(&self, key: &Path) {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

fn lock_file(dir: &Path, key: &Path) -> Result<File, PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::fs(dir, e))?;
    let path = dir.join(format!("{}.lock", run_key(key)));
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| PipelineError::fs(&path, e))?;

    match file.try_lock() {
        Ok(()) => {}
        Err(TryLockError::WouldBlock) => {
            tracing::warn!(lock = %path.display(), "Destination locked by another process");
            return Err(PipelineError::DestinationBusy(key.to_path_buf()));
        }
        Err(TryLockError::Error(e)) => return Err(PipelineError::fs(&path, e)),
    }

    // Owner details for whoever finds the lock held.
    file.set_len(0).map_err(|e| PipelineError::fs(&path, e))?;
    writeln!(file, "pid={}\nroot={}", std::process::id(), key.display())
        .map_err(|e| PipelineError::fs(&path, e))?;
    Ok(file)
}

/// Released on drop.
#[derive(Debug)]
pub struct DestinationLease {
    held: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
    _lock: Option<File>,
}

impl DestinationLease {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DestinationLease {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.path);
        tracing::debug!(destination = %self.path.display(), "Destination lease released");
    }
}
