//! Batch driver: runs CSV operations against the ledger.
//!
//! Each input row produces one output row describing its outcome. Invalid
//! rows are logged at warn level and skipped; failed operations are reported
//! in the output and do not stop the batch.

use crate::coins::CoinQuantities;
use crate::denomination::SUB_UNIT_SCALE;
use crate::error::{AppError, WalletError};
use crate::ledger::WalletLedger;
use crate::operation::{OperationRecord, WalletOperation};
use crate::relay::CreditRelay;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::io::{Read, Write};
use std::sync::Arc;

/// Output header.
pub const OUTPUT_HEADER: [&str; 6] = ["row", "op", "requested", "status", "amount", "coins"];

/// Counts of rows seen by [`BatchRunner::process_csv`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct BatchRunner<W: Write> {
    ledger: Arc<WalletLedger>,
    relay: Option<CreditRelay>,
    writer: csv::Writer<W>,
}

impl<W: Write> BatchRunner<W> {
    /// Creates a runner that writes results to `writer`, header first.
    pub fn new(ledger: Arc<WalletLedger>, writer: W) -> Result<Self, AppError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(OUTPUT_HEADER)?;
        Ok(BatchRunner {
            ledger,
            relay: None,
            writer,
        })
    }

    /// Routes credits through `relay` instead of applying them directly.
    pub fn with_relay(mut self, relay: CreditRelay) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Drops the relay handle so the credit worker can drain and stop.
    pub fn close_relay(&mut self) {
        self.relay = None;
    }

    /// Runs every operation from a CSV reader in order.
    pub async fn process_csv<R: Read>(&mut self, reader: R) -> Result<BatchSummary, AppError> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut summary = BatchSummary::default();

        for (row_idx, result) in csv_reader.deserialize::<OperationRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let operation = match result {
                Ok(record) => match record.parse() {
                    Ok(op) => op,
                    Err(problem) => {
                        warn!("Row {}: {}, skipping", row_num, problem);
                        summary.skipped += 1;
                        continue;
                    }
                },
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            if self.run_operation(row_num, operation).await? {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        self.writer.flush()?;
        Ok(summary)
    }

    /// Writes the current balance as a `final` row and flushes.
    pub async fn write_final_balance(&mut self) -> Result<(), AppError> {
        let snapshot = self.ledger.get_balance().await?;
        self.writer.write_record([
            String::new(),
            "final".to_string(),
            String::new(),
            "ok".to_string(),
            format_total(snapshot.total()),
            snapshot.coins.to_string(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns `true` if the operation succeeded.
    async fn run_operation(&mut self, row: usize, op: WalletOperation) -> Result<bool, AppError> {
        let outcome = match op {
            WalletOperation::Credit(amount) => match &self.relay {
                Some(relay) => relay
                    .submit(amount)
                    .await
                    .map(|_| ("accepted", amount.to_string(), CoinQuantities::EMPTY))
                    .map_err(WalletError::from),
                None => self
                    .ledger
                    .credit(amount)
                    .await
                    .map(|r| ("ok", amount.to_string(), r.minted)),
            },
            WalletOperation::Debit(amount) => self
                .ledger
                .debit(amount)
                .await
                .map(|r| {
                    let status = if r.rounded_up { "rounded" } else { "ok" };
                    (status, r.removed.to_string(), r.coins)
                }),
            WalletOperation::Balance => self
                .ledger
                .get_balance()
                .await
                .map(|s| ("ok", format_total(s.total()), s.coins)),
        };

        let requested = op.amount().map(|a| a.to_string()).unwrap_or_default();
        let succeeded = outcome.is_ok();
        let (status, amount, coins) = match outcome {
            Ok((status, amount, coins)) => (status, amount, coins.to_string()),
            Err(e) => {
                debug!("Row {}: {} failed: {}", row, op.name(), e);
                (e.label(), String::new(), String::new())
            }
        };

        self.writer.write_record([
            row.to_string(),
            op.name().to_string(),
            requested,
            status.to_string(),
            amount,
            coins,
        ])?;
        Ok(succeeded)
    }
}

fn format_total(mut total: Decimal) -> String {
    total.rescale(SUB_UNIT_SCALE);
    total.to_string()
}
