//! # Forms Runtime CLI
//!
//! Operator entry point for the forms signals core.
//!
//! ## Commands
//!
//! - `repair` - Re-run the Version Manager for unversioned forms and revoke
//!   tokens of ineligible accounts
//! - `status` - Table counts, dispatcher counters, invariant check
//! - `demo` - Run the end-to-end scenario on an in-memory store
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, environment, flags)
//! 2. Initialize logging and metrics
//! 3. Open the store and wire the hooks
//! 4. Run the command

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use forms_runtime::{run_demo, FormsRuntime, RuntimeConfig, StorageConfig};
use forms_telemetry::{encode_metrics, init_telemetry};

/// Forms signals core: version tracking and credential lifecycle.
#[derive(Parser, Debug)]
#[command(name = "forms-runtime", version)]
struct Cli {
    /// Data directory (overrides FM_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use an empty in-memory store
    #[arg(long, global = true)]
    in_memory: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level filter (overrides FM_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair derived state: missing versions and leftover tokens
    Repair,
    /// Show counters and check invariants
    Status {
        /// Also print Prometheus metrics
        #[arg(long)]
        metrics: bool,
    },
    /// Run the end-to-end scenario in memory
    Demo,
}

fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
        config.storage.persist = true;
    }
    if cli.in_memory || matches!(cli.command, Command::Demo) {
        config.storage = StorageConfig::ephemeral();
    }
    if let Some(level) = &cli.log_level {
        config.telemetry = config.telemetry.with_log_level(level.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print<T: Serialize + std::fmt::Debug>(json: bool, value: &T) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to encode output")?
        );
    } else {
        println!("{value:#?}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let _telemetry =
        init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;
    info!(
        service = %config.telemetry.service_name,
        data_dir = %config.storage.data_dir.display(),
        persist = config.storage.persist,
        "Starting forms runtime"
    );

    let runtime = FormsRuntime::new(config).context("Failed to start runtime")?;

    match cli.command {
        Command::Repair => {
            let summary = runtime.repair().context("Repair failed")?;
            print(cli.json, &summary)?;
            if !summary.is_successful() {
                bail!("repair finished with errors");
            }
        }
        Command::Status { metrics } => {
            let status = runtime.status();
            print(cli.json, &status)?;
            if metrics {
                println!("{}", encode_metrics().context("Failed to encode metrics")?);
            }
            if !status.is_healthy() {
                bail!(
                    "{} invariant violation(s), {} pending revocation(s); run `repair`",
                    status.violations.len(),
                    status.pending_revocations.len()
                );
            }
        }
        Command::Demo => {
            let outcome = run_demo(&runtime).context("Demo scenario failed")?;
            print(cli.json, &outcome)?;
            if !outcome.passed() {
                bail!("demo scenario did not match expectations");
            }
        }
    }

    Ok(())
}
