// Error taxonomy for the retrain cycle
//
// Every variant is recoverable at the cycle boundary: the controller logs it
// and reports "no retrain" rather than crashing a watch loop. Non-zero trainer
// exits are data, not errors; only contract violations and infrastructure
// failures live here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrainError {
    /// Dataset file missing or unreadable. Cycle skipped; retried next poll.
    #[error("dataset unavailable at {path}: {source}")]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Trainer executable not found. Misconfiguration: recurs every cycle
    /// until an operator fixes the path.
    #[error("training program not found: {path}")]
    CollaboratorMissing { path: PathBuf },

    /// Trainer could not be spawned (permissions, exec format, ...).
    #[error("failed to launch training program: {source}")]
    LaunchFailed {
        #[source]
        source: std::io::Error,
    },

    /// Trainer exceeded the wall-clock bound and was killed.
    #[error("training timed out after {secs} seconds")]
    Timeout { secs: u64 },

    /// Trainer exited non-zero. Captured output is logged by the controller.
    #[error("training failed with exit code {exit_code}")]
    CollaboratorFailed { exit_code: i32 },

    /// Trainer exited 0 but produced no artifact. Contract violation: the
    /// trainer itself is buggy, an operator should look at it.
    #[error("expected model artifact not found after training: {path}")]
    ArtifactMissing { path: PathBuf },

    /// Copying the artifact into the version store failed.
    #[error("failed to save model version: {source}")]
    VersionFailed {
        #[source]
        source: std::io::Error,
    },

    /// Marker update failed after a successful version save. Non-fatal: the
    /// version exists, the next cycle merely retrains redundantly.
    #[error("failed to write retrain marker: {source}")]
    MetadataWriteFailed {
        #[source]
        source: std::io::Error,
    },

    /// Unexpected I/O error while acquiring or releasing the run lock.
    #[error("lock operation failed: {source}")]
    LockFailed {
        #[source]
        source: std::io::Error,
    },
}
