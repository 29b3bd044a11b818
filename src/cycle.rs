// Retrain cycle controller
//
// One cycle walks Checking -> Training -> Versioning -> Recording; any
// failure drops back to Idle with nothing mutated (except the one accepted
// degradation: a marker write that fails after the version is already saved).
// The controller is lock-agnostic; callers serialize cycles with the run
// lock before invoking it.

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::RetrainError;
use crate::fingerprint::{fingerprint, has_changed};
use crate::launcher;
use crate::metadata::MetadataStore;
use crate::versioner::ArtifactVersioner;

/// Result of one cycle. Failures arrive pre-logged; `Skipped` carries the
/// classification so one-shot callers can turn it into an exit code.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Training ran and a new model version was saved.
    Retrained { version: PathBuf },
    /// Fingerprint matched the stored marker; nothing spawned, nothing written.
    Unchanged,
    /// The cycle was abandoned; no marker or version state was mutated.
    Skipped(RetrainError),
}

pub struct CycleController {
    config: Config,
    metadata: MetadataStore,
    versioner: ArtifactVersioner,
}

impl CycleController {
    pub fn new(config: Config) -> Result<Self, RetrainError> {
        let metadata = MetadataStore::new(&config.metadata);
        let versioner = ArtifactVersioner::new(&config.models_dir, &config.artifact_extension())?;
        Ok(Self {
            config,
            metadata,
            versioner,
        })
    }

    /// Write the sentinel marker so the next cycle retrains unconditionally.
    pub fn force_next(&self) -> Result<(), RetrainError> {
        self.metadata.force_next()
    }

    /// Perform one check-and-retrain cycle.
    ///
    /// Invariant: the marker is written only after the version is durably
    /// saved, and always with the fingerprint read at the start of this same
    /// cycle. No failure here ever leaves a partial marker or version.
    pub async fn run_cycle(&self) -> CycleOutcome {
        // Checking
        let current = match fingerprint(&self.config.dataset) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(error = %e, "Dataset check failed; skipping cycle");
                return CycleOutcome::Skipped(e);
            }
        };

        let stored = match self.metadata.read() {
            Ok(marker) => marker,
            Err(e) => {
                // Unreadable marker degrades to "absent": we retrain rather
                // than risk silently skipping a change.
                warn!(error = %e, path = %self.metadata.path().display(), "Could not read retrain marker; treating as absent");
                None
            }
        };

        if !has_changed(&current, stored.as_deref()) {
            info!("No data change detected; retrain not required");
            return CycleOutcome::Unchanged;
        }

        // Training
        info!(fingerprint = %current, "Data change detected; starting retrain");
        let output = match launcher::run(&self.config.trainer, self.config.train_timeout).await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Training did not complete");
                return CycleOutcome::Skipped(e);
            }
        };

        // Diagnostic output can appear even on success; log both streams
        // verbatim regardless of exit code.
        if !output.stdout.trim().is_empty() {
            info!(stdout = %output.stdout.trim(), "Training stdout");
        }
        if !output.stderr.trim().is_empty() {
            error!(stderr = %output.stderr.trim(), "Training stderr");
        }

        if !output.success() {
            let exit_code = output.exit_code.unwrap_or(-1);
            let e = RetrainError::CollaboratorFailed { exit_code };
            error!(exit_code, "Training failed");
            return CycleOutcome::Skipped(e);
        }

        // Versioning
        let version = match self.versioner.save(&self.config.artifact) {
            Ok(version) => version,
            Err(e) => {
                error!(error = %e, "Failed to save model version");
                return CycleOutcome::Skipped(e);
            }
        };

        // Recording. A failure past this point is non-fatal: the version is
        // durable, the next cycle just recomputes the same fingerprint and
        // retrains redundantly.
        if let Err(e) = self.metadata.write(&current) {
            warn!(error = %e, "Marker update failed; next cycle will retrain redundantly");
        }

        info!(version = %version.display(), "Retrain complete");
        CycleOutcome::Retrained { version }
    }
}
