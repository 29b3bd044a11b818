// Retrainer - single-node retrain orchestrator
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use retrainer::config::load_config;
use retrainer::cycle::{CycleController, CycleOutcome};
use retrainer::{lock, Config};

#[derive(Parser, Debug)]
#[command(name = "retrainer")]
#[command(about = "Watch a dataset and retrain the model when it changes", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run one check-and-retrain cycle
    Run {
        /// Retrain regardless of whether the dataset changed
        #[arg(long)]
        force: bool,
    },
    /// Poll the dataset and retrain on change until interrupted
    Watch {
        /// Seconds between polls (overrides the config file)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Run { force } => run_once(config, force).await,
        Command::Watch { interval } => {
            if let Some(secs) = interval {
                config.poll_interval = Duration::from_secs(secs);
            }
            run_watch(config).await
        }
    }
}

/// One-shot invocation. A cycle failure surfaces as a non-zero exit for
/// scripting; a busy lock is a clean skip, not a failure.
async fn run_once(config: Config, force: bool) -> Result<()> {
    let lock_file = config.lock_file.clone();
    let Some(_guard) = lock::acquire(&lock_file)? else {
        error!("Another retrain is already running (lock file present); skipping");
        return Ok(());
    };

    let controller = CycleController::new(config)?;
    if force {
        info!("Forced run: will retrain regardless of checksum");
        controller.force_next()?;
    }

    match controller.run_cycle().await {
        CycleOutcome::Retrained { version } => {
            info!(version = %version.display(), "Retrain occurred");
            Ok(())
        }
        CycleOutcome::Unchanged => Ok(()),
        // Already logged with context by the controller; the non-zero exit
        // is for callers scripting around `retrainer run`.
        CycleOutcome::Skipped(e) => Err(e).context("Retrain cycle failed"),
    }
}

/// Polling loop. Cycle failures never end the loop; only Ctrl-C does.
async fn run_watch(config: Config) -> Result<()> {
    info!(
        interval_secs = config.poll_interval.as_secs(),
        "Starting watch mode; Ctrl-C to stop"
    );

    let lock_file = config.lock_file.clone();
    let interval = config.poll_interval;
    let controller = CycleController::new(config)?;

    loop {
        match lock::acquire(&lock_file) {
            Ok(Some(_guard)) => {
                // Outcome is already logged; the loop carries on regardless.
                let _ = controller.run_cycle().await;
            }
            Ok(None) => info!("Another retrain process is active; skipping this cycle"),
            Err(e) => warn!(error = %e, "Could not acquire run lock"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Watch mode stopped");
                return Ok(());
            }
        }
    }
}

fn init_tracing() {
    // Default: INFO level, overridable with RUST_LOG
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
