//! P2P spread recorder - entry point
//!
//! 1. Loads configuration (YAML file, `.env`, environment overrides)
//! 2. Seeds the checkpoint (`--seed`) or resumes from it
//! 3. Connects to Google Sheets, or to an in-memory sheet with `--dry-run`
//! 4. Runs the scheduling loop until Ctrl+C or the first failure
//!
//! Usage: `spread_recorder [CONFIG_PATH] [--seed] [--dry-run]`

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use spread_recorder::adapters::{BinanceClient, GoogleSheetsClient, MemorySheet, SheetStore};
use spread_recorder::config::{self, constants, AppConfig};
use spread_recorder::core::{init_logging, CheckpointStore, Scheduler, SystemClock};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Records the Binance P2P spread into a Google Sheets grid
#[derive(Debug, PartialEq, Parser)]
#[command(name = "spread_recorder", version)]
struct CliArgs {
    /// YAML configuration file (defaults to config.yaml when present)
    config_path: Option<PathBuf>,

    /// Write the initial checkpoint (first data row, today) and exit
    #[arg(long)]
    seed: bool,

    /// Record into an in-memory sheet instead of Google Sheets
    #[arg(long)]
    dry_run: bool,
}

/// Explicit paths must exist; the default path falls back to built-in defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => Ok(config::load_config(path)?),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Ok(config::load_config(Path::new(DEFAULT_CONFIG_PATH))?)
        }
        None => {
            info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    init_logging();

    let args = CliArgs::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = args.seed,
        dry_run = args.dry_run,
        "Spread recorder starting"
    );
    constants::log_configuration();

    let config = load_configuration(args.config_path.as_deref()).map_err(|e| {
        error!(error = %e, "Configuration failed");
        e
    })?;
    info!(
        spreadsheet = %config.sheets.spreadsheet_name,
        worksheet = %config.sheets.worksheet,
        checkpoint = %config.checkpoint.path.display(),
        methods = config.payment_methods.len(),
        buckets = config.buckets.len(),
        "Configuration loaded"
    );

    let checkpoints = CheckpointStore::new(&config.checkpoint.path);
    if args.seed {
        checkpoints
            .seed(config.layout.first_data_row, Local::now().date_naive())
            .await
            .context("Failed to seed checkpoint")?;
        return Ok(());
    }

    // Create shutdown broadcast channel
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    // Spawn SIGINT handler task
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("[SHUTDOWN] Graceful shutdown initiated");
                let _ = shutdown_tx.send(());
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for Ctrl+C signal");
            }
        }
    });

    if args.dry_run {
        info!("Dry run: recording into an in-memory sheet");
        let sheet = MemorySheet::new();
        // Every configured method starts switched on
        for method in &config.payment_methods {
            let flag = format!("{}{}", method.column, config.layout.methods_row + 1);
            sheet.put(&flag, "1");
        }
        run_scheduler(&config, sheet, checkpoints, shutdown_rx).await?;
    } else {
        let sheet = GoogleSheetsClient::connect(&config.sheets)
            .await
            .context("Failed to open the spreadsheet")?;
        run_scheduler(&config, sheet, checkpoints, shutdown_rx).await?;
    }

    info!("[SHUTDOWN] Clean exit");
    Ok(())
}

async fn run_scheduler<S: SheetStore>(
    config: &AppConfig,
    sheet: S,
    checkpoints: CheckpointStore,
    shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let prices = BinanceClient::new(config.binance.clone());
    let mut scheduler = Scheduler::start(config, prices, sheet, checkpoints, SystemClock).await?;
    scheduler.run(shutdown_rx).await?;
    Ok(())
}
