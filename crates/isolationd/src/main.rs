//! isolationd - Host Network-Isolation Daemon
//!
//! Entry point for the isolationd operator CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use netisol_common::OperationResult;
use netisol_isolationd::{
    FileResourceControl, IsolationConfig, IsolationMgr, TagStateStore, QUARANTINE_GROUP_ENV,
};

/// Environment variable naming the host inventory file.
const INVENTORY_ENV: &str = "ISOLATION_INVENTORY";

/// Exit code for an operation that completed with per-interface failures.
const EXIT_PARTIAL: u8 = 2;

/// Host network-isolation controller
#[derive(Parser, Debug)]
#[command(name = "isolationd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON host inventory (defaults to $ISOLATION_INVENTORY)
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Quarantine group to move interfaces into (defaults to $QUARANTINE_GROUP_ID)
    #[arg(short = 'g', long)]
    quarantine_group: Option<String>,

    /// Per-call timeout for resource-control operations, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace a host's interface memberships with the quarantine group
    Quarantine {
        /// Host identifier
        host_id: String,
    },
    /// Restore a host's interfaces to their pre-quarantine memberships
    Restore {
        /// Host identifier
        host_id: String,
    },
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) {
    let level: Level = level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn report(result: &OperationResult) -> ExitCode {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("failed to encode result: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if result.is_fully_applied() {
        ExitCode::SUCCESS
    } else {
        // Callers alert on any failed entry.
        ExitCode::from(EXIT_PARTIAL)
    }
}

async fn run(args: Args) -> ExitCode {
    let inventory = match args
        .inventory
        .or_else(|| std::env::var(INVENTORY_ENV).ok().map(PathBuf::from))
    {
        Some(path) => path,
        None => {
            error!(
                "no host inventory configured (supply --inventory or {})",
                INVENTORY_ENV
            );
            return ExitCode::FAILURE;
        }
    };

    let quarantine_group = args
        .quarantine_group
        .or_else(|| std::env::var(QUARANTINE_GROUP_ENV).ok());

    let config = match IsolationConfig::new(
        quarantine_group,
        Duration::from_secs(args.timeout_secs),
    ) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match FileResourceControl::open(&inventory).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("failed to open inventory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = Box::new(TagStateStore::new(client.clone()));
    let mgr = IsolationMgr::new(client, store, config);

    let outcome = match args.command {
        Command::Quarantine { host_id } => mgr.quarantine(&host_id).await,
        Command::Restore { host_id } => mgr.restore(&host_id).await,
    };

    match outcome {
        Ok(result) => report(&result),
        Err(e) => {
            error!("operation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting isolationd ---");
    run(args).await
}
