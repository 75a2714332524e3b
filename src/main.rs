//! NeoWatch — near-Earth asteroid monitoring service.
//!
//! Entry point that wires configuration, logging, database, and the feed
//! synchronization pipeline together.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use neowatch_core::config::AppConfig;
use neowatch_core::error::AppError;
use neowatch_core::observe::TracingObserver;
use neowatch_database::DatabasePool;
use neowatch_service::SyncService;

#[derive(Parser)]
#[command(name = "neowatch", version, about = "Near-Earth asteroid monitor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one synchronization pass against the NASA feeds.
    Sync {
        /// Cap the number of asteroid records fetched this run.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Synchronize periodically until interrupted.
    Run {
        /// Seconds between passes (defaults to the configured interval).
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, cli.command).await {
        tracing::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("NEOWATCH_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig, command: Command) -> Result<(), AppError> {
    tracing::info!("Starting NeoWatch v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    let observer = Arc::new(TracingObserver);
    let service = SyncService::new(db.clone(), &config, observer)?;

    match command {
        Command::Sync { limit } => {
            service.run_full_sync(limit).await?;
        }
        Command::Run { interval_secs } => {
            let interval =
                Duration::from_secs(interval_secs.unwrap_or(config.sync.interval_seconds));
            loop {
                if let Err(e) = service.run_full_sync(None).await {
                    tracing::error!("Synchronization pass failed: {e}");
                }
                tracing::info!(seconds = interval.as_secs(), "Sleeping until next pass");
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown requested");
                        break;
                    }
                }
            }
        }
    }

    db.close().await;
    Ok(())
}
