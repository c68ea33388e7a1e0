//! # utx-runner
//!
//! Entry point for the unconfirmed-transaction feed reader.
//!
//! Connects to the push feed, subscribes to unconfirmed transactions, and
//! prints every decoded transaction to stdout until the connection fails or
//! Ctrl+C is pressed. Logs go to stderr (and optionally a daily log file).
//!
//! # Usage
//!
//! ```bash
//! utx-runner                      # public feed, default settings
//! utx-runner config.json -l debug --log-dir /tmp/log --log-json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use utx_core::Transaction;
use utx_core::config::{AppConfig, load_config};
use utx_core::logging::LogOptions;
use utx_core::ws::{FeedConnection, WsConnConfig};
use utx_stream::dispatcher::Dispatcher;
use utx_stream::stats::FeedStats;
use utx_stream::worker_pool::{OnTransaction, WorkerPool};

/// Unconfirmed-transaction feed reader.
#[derive(Parser)]
#[command(name = "utx-runner", about = "Stream unconfirmed transactions from a push feed")]
struct Cli {
    /// Configuration file path (JSON). Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    utx_core::logging::init_logging(&LogOptions {
        level: &cli.log_level,
        dir: cli.log_dir.as_deref(),
        file_prefix: "utx-runner",
        json: cli.log_json,
    });

    // 2. Load configuration
    let config = match &cli.config {
        Some(path) => {
            info!("utx-runner starting — config={}, log_level={}", path.display(), cli.log_level);
            load_config(path)?
        }
        None => {
            info!("utx-runner starting — default config, log_level={}", cli.log_level);
            AppConfig::default()
        }
    };

    // 3. Connect and subscribe. Failure here is fatal.
    let mut conn = FeedConnection::connect(&WsConnConfig::from_feed(&config.feed)).await?;

    // 4. Start workers and the periodic stats printer
    let stats = Arc::new(FeedStats::new());
    let on_tx: OnTransaction = Arc::new(|tx: Transaction| println!("{tx}"));
    let pool = WorkerPool::start(&config.workers, on_tx, stats.clone());
    let stats_task = config.stats_interval().map(|period| tokio::spawn(print_stats(stats.clone(), period)));

    // 5. Run the control loop until the feed fails or Ctrl+C
    let mut dispatcher = Dispatcher::new(stats.clone());
    let outcome: Result<()> = tokio::select! {
        res = dispatcher.run(&mut conn, &pool) => {
            if let Err(ref e) = res {
                error!("feed terminated: {e}");
            }
            res.map_err(Into::into)
        }
        sig = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            sig.map_err(Into::into)
        }
    };

    // 6. Tear down
    if let Some(task) = stats_task {
        task.abort();
    }
    if outcome.is_ok() {
        conn.close().await;
    }
    if dispatcher.pending_bytes() > 0 {
        info!("discarding {} byte(s) of an incomplete message", dispatcher.pending_bytes());
    }
    pool.shutdown().await;
    info!("[stats] final: {}", stats.snapshot());

    outcome
}

/// Log a stats line every `period`.
async fn print_stats(stats: Arc<FeedStats>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        interval.tick().await;
        info!("[stats] {}", stats.snapshot());
    }
}
