// Configuration structs

use std::path::PathBuf;
use std::time::Duration;

/// All paths and bounds for one orchestrator instance. Built once in main
/// and passed into the controller; nothing here is global.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dataset file watched for content changes
    pub dataset: PathBuf,

    /// Marker file recording the fingerprint of the last processed dataset
    pub metadata: PathBuf,

    /// Directory holding timestamped model versions plus the latest pointer
    pub models_dir: PathBuf,

    /// Training program to execute on change
    pub trainer: PathBuf,

    /// Path where the trainer is contracted to write its artifact
    pub artifact: PathBuf,

    /// Lock file serializing cycles on this host
    pub lock_file: PathBuf,

    /// Sleep between cycles in watch mode
    pub poll_interval: Duration,

    /// Wall-clock bound on one training run
    pub train_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/add.csv"),
            metadata: PathBuf::from("data/last_retrain.txt"),
            models_dir: PathBuf::from("models"),
            trainer: PathBuf::from("train_model.py"),
            artifact: PathBuf::from("model.pkl"),
            lock_file: PathBuf::from(".retrain.lock"),
            poll_interval: Duration::from_secs(300),
            train_timeout: Duration::from_secs(3600),
        }
    }
}

impl Config {
    /// Artifact file extension without the dot ("pkl" for model.pkl).
    /// Version names in the store reuse it.
    pub fn artifact_extension(&self) -> String {
        self.artifact
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bin".to_string())
    }
}
