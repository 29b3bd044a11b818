// Training subprocess launcher
//
// Runs the external training program as a bounded child process. Output is
// captured fully, not streamed; a non-zero exit is returned as data for the
// controller to classify. Only "cannot launch" and "exceeded the wall-clock
// bound" are errors at this layer.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

use crate::errors::RetrainError;

/// Captured result of one training run.
#[derive(Debug)]
pub struct TrainingOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl TrainingOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run the training program and wait for it to exit, up to `timeout`.
///
/// Spawns exactly one child per call; no retries here (a failed cycle waits
/// for the next poll). On timeout the child is killed before returning.
pub async fn run(program: &Path, timeout: Duration) -> Result<TrainingOutput, RetrainError> {
    if !program.exists() {
        return Err(RetrainError::CollaboratorMissing {
            path: program.to_path_buf(),
        });
    }

    info!(program = %program.display(), "Launching training");

    let mut cmd = Command::new(program);
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        // Force UTF-8 text I/O in the child so captured output decodes the
        // same way on every platform.
        .env("PYTHONIOENCODING", "utf-8")
        .env("LC_ALL", "C.UTF-8")
        .env("LANG", "C.UTF-8")
        // If we give up waiting, dropping the child must kill it.
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|source| RetrainError::LaunchFailed { source })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| RetrainError::LaunchFailed { source })?,
        Err(_) => {
            return Err(RetrainError::Timeout {
                secs: timeout.as_secs(),
            });
        }
    };

    Ok(TrainingOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
