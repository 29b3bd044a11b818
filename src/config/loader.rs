// Configuration loader
// Merges an optional retrainer.toml over built-in defaults

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::settings::Config;

/// Load configuration, overlaying the TOML file at `path` (when given and
/// present) on the defaults. Every key is optional; CLI flags are applied
/// on top by the caller.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    let Some(path) = path else {
        return Ok(config);
    };
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    #[derive(serde::Deserialize)]
    struct TomlConfig {
        dataset: Option<PathBuf>,
        metadata: Option<PathBuf>,
        models_dir: Option<PathBuf>,
        trainer: Option<PathBuf>,
        artifact: Option<PathBuf>,
        lock_file: Option<PathBuf>,
        poll_interval_secs: Option<u64>,
        train_timeout_secs: Option<u64>,
    }

    let toml_config: TomlConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Some(v) = toml_config.dataset {
        config.dataset = v;
    }
    if let Some(v) = toml_config.metadata {
        config.metadata = v;
    }
    if let Some(v) = toml_config.models_dir {
        config.models_dir = v;
    }
    if let Some(v) = toml_config.trainer {
        config.trainer = v;
    }
    if let Some(v) = toml_config.artifact {
        config.artifact = v;
    }
    if let Some(v) = toml_config.lock_file {
        config.lock_file = v;
    }
    if let Some(v) = toml_config.poll_interval_secs {
        config.poll_interval = Duration::from_secs(v);
    }
    if let Some(v) = toml_config.train_timeout_secs {
        config.train_timeout = Duration::from_secs(v);
    }

    Ok(config)
}
