use clap::{Parser, Subcommand};
use ledger_service::{BalanceService, LedgerConfig, PostgresLedgerStore};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ledger Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ledger service
    Start {
        /// Database URL
        #[arg(short, long)]
        database_url: Option<String>,

        /// Database pool size
        #[arg(short, long)]
        pool_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ledger_service={}",
            cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Process commands
    match cli.command {
        Commands::Start {
            database_url,
            pool_size,
        } => {
            // Create config using provided values or env vars
            let config = if let Some(url) = database_url {
                LedgerConfig::new(url, pool_size.unwrap_or(5))
            } else {
                LedgerConfig::from_env()
            };

            info!(
                "Starting ledger service with database pool size: {}",
                config.db_pool_size
            );

            // Connect and bring the schema up to date
            let store = PostgresLedgerStore::with_config(&config).await?;
            common::db::run_migrations(store.pool()).await?;

            let _service = BalanceService::with_store(Arc::new(store));

            // Wait for ctrl-c
            info!("Ledger service started. Press Ctrl+C to stop.");
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutting down ledger service...");
                }
                Err(err) => {
                    error!("Error waiting for Ctrl+C: {}", err);
                }
            }
        }
    }

    Ok(())
}
