//! Coin Wallet CLI
//!
//! Runs a CSV of wallet operations against a fresh in-memory wallet and
//! writes one result row per operation, followed by the final balance.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > results.csv
//! cargo run -- operations.csv --relay-credits > results.csv
//! ```
//!
//! With `--relay-credits`, credits are queued to a worker task that applies
//! them concurrently with the remaining rows.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use coin_wallet::{
    credit_channel, AppError, BatchRunner, CreditWorker, LedgerConfig, MemoryLockProvider,
    MemoryStore, WalletLedger,
};
use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(AppError::MissingArgument);
    }

    let input_path = &args[1];
    let relay_credits = args[2..].iter().any(|a| a == "--relay-credits");

    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let config = LedgerConfig::default();
    let ledger = Arc::new(WalletLedger::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryLockProvider::new()),
        config.clone(),
    ));

    let mut runner = BatchRunner::new(Arc::clone(&ledger), io::stdout())?;

    let worker = if relay_credits {
        let (relay, inbox) = credit_channel(config.relay_capacity);
        runner = runner.with_relay(relay);
        let worker = CreditWorker::new(Arc::clone(&ledger), inbox);
        Some(tokio::spawn(worker.run()))
    } else {
        None
    };

    let summary = runner.process_csv(reader).await?;
    runner.close_relay();

    if let Some(handle) = worker {
        let stats = handle.await?;
        info!("Relayed credits: {} applied, {} failed", stats.applied, stats.failed);
    }

    runner.write_final_balance().await?;
    info!(
        "Processed {} operations ({} failed, {} skipped)",
        summary.succeeded + summary.failed,
        summary.failed,
        summary.skipped
    );

    Ok(())
}
