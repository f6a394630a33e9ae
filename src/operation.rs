//! Wallet operation records for batch input.

use crate::amount::Amount;
use crate::error::AmountError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Raw operation as read from CSV.
///
/// The amount is kept as a string so parsing can be reported per row; it is
/// absent for balance queries.
#[derive(Debug, Deserialize)]
pub struct OperationRecord {
    /// Operation type: credit, debit, balance
    pub op: String,

    /// Amount (present for credit/debit)
    pub amount: Option<String>,
}

/// Why a record could not be turned into an operation.
#[derive(Debug, PartialEq)]
pub enum RecordProblem {
    UnknownOperation(String),
    MissingAmount,
    BadAmount(AmountError),
}

impl fmt::Display for RecordProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordProblem::UnknownOperation(op) => write!(f, "unknown operation '{}'", op),
            RecordProblem::MissingAmount => write!(f, "missing amount"),
            RecordProblem::BadAmount(e) => write!(f, "{}", e),
        }
    }
}

impl OperationRecord {
    /// Parses the raw record into a typed operation.
    pub fn parse(&self) -> Result<WalletOperation, RecordProblem> {
        match self.op.trim().to_lowercase().as_str() {
            "credit" => Ok(WalletOperation::Credit(self.parse_amount()?)),
            "debit" => Ok(WalletOperation::Debit(self.parse_amount()?)),
            "balance" => Ok(WalletOperation::Balance),
            other => Err(RecordProblem::UnknownOperation(other.to_string())),
        }
    }

    fn parse_amount(&self) -> Result<Amount, RecordProblem> {
        let raw = self
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(RecordProblem::MissingAmount)?;
        Amount::from_str(raw).map_err(RecordProblem::BadAmount)
    }
}

/// A validated operation ready to run against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletOperation {
    /// Add funds.
    Credit(Amount),

    /// Withdraw funds, reporting the coins removed.
    Debit(Amount),

    /// Report the current balance.
    Balance,
}

impl WalletOperation {
    pub fn name(&self) -> &'static str {
        match self {
            WalletOperation::Credit(_) => "credit",
            WalletOperation::Debit(_) => "debit",
            WalletOperation::Balance => "balance",
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            WalletOperation::Credit(a) | WalletOperation::Debit(a) => Some(*a),
            WalletOperation::Balance => None,
        }
    }
}
