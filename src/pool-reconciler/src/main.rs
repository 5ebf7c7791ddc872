//! Pool Reconciler Service
//!
//! Reads authoritative pool totals and status for each active market from
//! the ledger node API and overwrites the local PostgreSQL cache.

mod metrics;
mod reconcile;
mod store;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::sleep;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use common::{Config, Database, HttpLedgerClient};

use crate::metrics::Metrics;
use crate::reconcile::sync_markets;
use crate::store::PgMarketStore;

/// Pool Reconciler - mirrors ledger pool state into the local store
#[derive(Parser, Debug)]
#[command(name = "pool-reconciler")]
#[command(about = "Syncs market pool totals from the ledger into PostgreSQL")]
struct Args {
    /// Run once and exit (instead of continuous polling)
    #[arg(long)]
    once: bool,

    /// Poll interval in seconds (defaults to SYNC_INTERVAL_SECS)
    #[arg(long)]
    interval: Option<u64>,

    /// Print the full per-market report as JSON after each run
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder().with_max_level(Level::INFO).init();

    let args = Args::parse();

    info!("Pool Reconciler starting...");
    info!(
        "Mode: {}",
        if args.once {
            "single run"
        } else {
            "continuous"
        }
    );

    // Load configuration
    let config = Config::from_env()?;
    let interval = args.interval.unwrap_or(config.sync_interval_secs);
    info!("Interval: {}s", interval);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&config).await?;
    db.health_check().await?;
    info!("Database connected successfully");

    // Create ledger client
    let ledger = HttpLedgerClient::new(&config)?;
    info!("Ledger API client initialized ({})", config.ledger_api_url);

    let store = PgMarketStore::new(db);
    let mut metrics = Metrics::new();

    // Main loop
    loop {
        match sync_markets(&store, &ledger).await {
            Ok(report) => {
                metrics.record_report(&report);
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
            Err(e) => {
                error!("Reconciliation run failed: {}", e);
                metrics.record_fatal();
            }
        }

        if args.once {
            info!("Single run mode - exiting");
            break;
        }

        // Periodic summary so long-running deployments stay observable
        if metrics.runs() > 0 && metrics.runs() % 10 == 0 {
            metrics.print_summary();
        }

        info!("Sleeping for {}s...", interval);
        sleep(Duration::from_secs(interval)).await;
    }

    metrics.print_summary();

    Ok(())
}
