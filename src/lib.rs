// Retrainer - single-node retrain orchestrator
//
// Watches a dataset file for content changes; on change, runs an external
// training program, versions the produced model artifact, and records which
// dataset fingerprint produced it.

pub mod config;
pub mod cycle;
pub mod errors;
pub mod fingerprint;
pub mod launcher;
pub mod lock;
pub mod metadata;
pub mod versioner;

pub use config::Config;
pub use cycle::{CycleController, CycleOutcome};
pub use errors::RetrainError;
