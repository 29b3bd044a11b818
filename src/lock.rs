// Host-local run lock
//
// A lock file created with create_new (atomic create-if-absent) serializes
// whole retrain cycles across overlapping invocations on one machine. The
// lock is advisory: its content is the holder's PID, for diagnostics only.
//
// A crash can leave the file behind. Recovery is deliberately operational
// (an operator removes the stale file) rather than automatic, because
// automatic expiry could let two trainings run concurrently.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::RetrainError;

/// RAII guard for the lock file. Releasing happens on drop, so every exit
/// path out of a cycle (success, failure, panic unwind) releases the lock.
pub struct RunLockGuard {
    path: PathBuf,
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        // Tolerate an already-missing file: release is idempotent.
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Run lock released"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove lock file"),
        }
    }
}

/// Attempt to acquire the run lock at `path`.
///
/// Returns `Ok(Some(guard))` only if this call created the lock file,
/// `Ok(None)` if another run already holds it.
pub fn acquire(path: &Path) -> Result<Option<RunLockGuard>, RetrainError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            // Advisory content; never read back by the logic.
            if let Err(e) = writeln!(file, "{}", std::process::id()) {
                warn!(error = %e, "Could not write PID to lock file");
            }
            debug!(path = %path.display(), "Run lock acquired");
            Ok(Some(RunLockGuard {
                path: path.to_path_buf(),
            }))
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(source) => Err(RetrainError::LockFailed { source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".retrain.lock");

        let guard = acquire(&lock_path).unwrap();
        assert!(guard.is_some());
        assert!(lock_path.exists());

        drop(guard);
        assert!(!lock_path.exists());

        // Reacquirable after release
        assert!(acquire(&lock_path).unwrap().is_some());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".retrain.lock");

        let _guard = acquire(&lock_path).unwrap().unwrap();
        assert!(acquire(&lock_path).unwrap().is_none());
    }

    #[test]
    fn test_release_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".retrain.lock");

        let guard = acquire(&lock_path).unwrap().unwrap();
        // Simulate an operator clearing the lock out from under us.
        std::fs::remove_file(&lock_path).unwrap();
        drop(guard); // must not panic
    }
}
