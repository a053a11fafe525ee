// ABOUTME: Command-line entry point for syncing, bulk collection and ledger inspection
// ABOUTME: Wires configuration, logging, the throttled Garmin client and the SQLite store together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Wellness Sync Binary
//!
//! Usage:
//! ```bash
//! # One sync cycle, then exit
//! cargo run --bin wellness-sync -- sync
//!
//! # Sync every SYNC_INTERVAL_SECS until Ctrl-C
//! cargo run --bin wellness-sync -- sync --mode continuous
//!
//! # Re-collect the last 30 days of sleep and daily summaries
//! cargo run --bin wellness-sync -- collect --days-back 30 --metrics sleep,daily_summary
//!
//! # Show the last 10 ledger entries
//! cargo run --bin wellness-sync -- status --limit 10
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::future::pending;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use wellness_providers::{
    initialize_shared_client, GarminConnectProvider, RateLimiter, ThrottledSource,
    WellnessDataSource,
};
use wellness_sync::collectors::MetricSet;
use wellness_sync::config::SyncConfig;
use wellness_sync::database::Database;
use wellness_sync::ledger::CollectionLedger;
use wellness_sync::logging;
use wellness_sync::orchestrator::RunResult;
use wellness_sync::sync::SyncService;

/// Connect timeout for the shared HTTP client
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Parser)]
#[command(name = "wellness-sync")]
#[command(about = "Collect Garmin Connect wellness data into a local SQLite store")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Collect whatever the remote has that the local store is missing
    Sync {
        /// Run once or keep syncing
        #[arg(long, value_enum, default_value_t = SyncMode::Single)]
        mode: SyncMode,
    },
    /// Collect a fixed window ending today
    Collect {
        /// Days before today to include (defaults to BULK_DAYS_BACK)
        #[arg(long)]
        days_back: Option<u32>,

        /// Comma-separated metric families, `default` or `all`
        #[arg(long)]
        metrics: Option<String>,
    },
    /// Show recent collection runs
    Status {
        /// Number of runs to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SyncMode {
    /// One cycle, then exit
    Single,
    /// Cycle until Ctrl-C
    Continuous,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = SyncConfig::from_env()?;
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;

    if let Command::Status { limit } = args.command {
        print_status(&CollectionLedger::new(database), limit).await?;
        return Ok(ExitCode::SUCCESS);
    }

    initialize_shared_client(config.call_timeout.as_secs(), CONNECT_TIMEOUT_SECS);
    let garmin: Arc<dyn WellnessDataSource> = Arc::new(GarminConnectProvider::new(
        config.garmin.clone(),
        config.credentials.clone(),
    ));
    let source: Arc<dyn WellnessDataSource> = Arc::new(ThrottledSource::new(
        garmin,
        Arc::new(RateLimiter::new(config.rate_limit)),
        config.call_timeout,
    ));
    let service = SyncService::new(database, source, &config);

    match args.command {
        Command::Sync {
            mode: SyncMode::Single,
        } => {
            let outcome = service.run_single_sync_cycle().await?;
            if let Some(run) = &outcome.run {
                print_run(run);
            }
            println!(
                "Checkpoint {}",
                if outcome.synced { "advanced" } else { "unchanged" }
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Sync {
            mode: SyncMode::Continuous,
        } => {
            service.run_continuous_sync(shutdown_signal()).await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Collect { days_back, metrics } => {
            let metrics = metrics.as_deref().map(MetricSet::parse).transpose()?;
            let run = service
                .run_bulk_collection(days_back, metrics.as_ref())
                .await?;
            print_run(&run);
            Ok(if run.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Status { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        // Without a signal handler the loop runs until the process is killed
        pending::<()>().await;
    }
}

fn print_run(run: &RunResult) {
    println!(
        "Run {} ({}): {} to {}",
        run.run_id,
        run.collection_type,
        run.window.start(),
        run.window.end()
    );
    println!(
        "  APIs: {}/{} succeeded ({:.1}%)",
        run.apis_succeeded,
        run.apis_attempted,
        run.success_rate() * 100.0
    );
    println!(
        "  Data points: {}, records written: {}",
        run.total_data_points(),
        run.records_collected
    );
    for failure in &run.errors {
        println!(
            "  skipped {} {}: {} ({})",
            failure.family, failure.date, failure.message, failure.kind
        );
    }
}

async fn print_status(ledger: &CollectionLedger, limit: u32) -> Result<()> {
    let runs = ledger.recent(limit).await?;
    if runs.is_empty() {
        println!("No collection runs recorded");
        return Ok(());
    }

    for run in runs {
        let duration = run
            .duration()
            .map_or_else(|| "-".to_owned(), |d| format!("{}s", d.num_seconds()));
        println!(
            "#{:<5} {:<5} {:<8} {} {:>8} records={} {}",
            run.id,
            run.collection_type.as_str(),
            run.status.as_str(),
            run.start_time.format("%Y-%m-%d %H:%M:%S"),
            duration,
            run.records_collected,
            run.error_message.unwrap_or_default()
        );
    }
    Ok(())
}
