//! Error types for the wallet ledger and the batch CLI.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Outcomes of a ledger operation that did not succeed.
///
/// Nothing is persisted when any of these is returned. Business outcomes
/// (`InsufficientFunds`, `NoExactCombination`, `InvalidAmount`) should be
/// rejected; infrastructure outcomes may be retried as a whole operation.
#[derive(Error, Debug)]
pub enum WalletError {
    /// The wallet lease was not granted within the bounded wait
    #[error("lock on '{resource}' not granted within {waited:?}")]
    LockUnavailable { resource: String, waited: Duration },

    /// The lock provider itself failed
    #[error("lock provider failure: {0}")]
    LockProvider(#[from] LockError),

    /// No subset of the held coins sums to the requested sub-unit amount
    #[error("exact change unavailable: no coin combination adds up to {target} sub-units")]
    NoExactCombination { target: u32 },

    /// Requested whole units exceed the whole units held
    #[error("insufficient funds: requested {requested} whole units, {available} available")]
    InsufficientFunds { requested: u64, available: u64 },

    /// Reading or writing the balance snapshot failed
    #[error("balance store failure: {0}")]
    Store(#[from] StoreError),

    /// Submitting a credit to the asynchronous relay failed
    #[error("credit relay failure: {0}")]
    Relay(#[from] RelayError),

    /// The submitted amount cannot be applied
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
}

impl WalletError {
    /// Expected outcomes of a well-formed request against the current balance.
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            WalletError::InsufficientFunds { .. }
                | WalletError::NoExactCombination { .. }
                | WalletError::InvalidAmount(_)
        )
    }

    /// Infrastructure failures where retrying the whole operation is reasonable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::LockUnavailable { .. }
                | WalletError::LockProvider(_)
                | WalletError::Store(_)
                | WalletError::Relay(_)
        )
    }

    /// Short machine-readable label, used in batch output.
    pub fn label(&self) -> &'static str {
        match self {
            WalletError::LockUnavailable { .. } => "lock_unavailable",
            WalletError::LockProvider(_) => "lock_failure",
            WalletError::NoExactCombination { .. } => "no_exact_combination",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::Store(_) => "store_failure",
            WalletError::Relay(_) => "relay_failure",
            WalletError::InvalidAmount(_) => "invalid_amount",
        }
    }
}

/// Errors from the key-value backend holding the snapshot.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or returned an error
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend reported that the write was not applied
    #[error("write to '{key}' was rejected")]
    WriteRejected { key: String },

    /// The stored bytes are not a valid snapshot
    #[error("snapshot encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors from the lease-lock backend.
#[derive(Error, Debug)]
pub enum LockError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors from the asynchronous credit channel.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RelayError {
    /// The consumer side has shut down
    #[error("credit relay is closed")]
    Closed,
}

/// Errors decomposing a monetary value into whole and sub-units.
#[derive(Error, Debug, PartialEq)]
pub enum AmountError {
    #[error("amount must not be negative")]
    Negative,

    #[error("amount exceeds the representable range")]
    Overflow,

    #[error("sub-unit part {0} is not below the whole-unit size")]
    SubUnitsOutOfRange(u32),

    #[error("could not parse amount: {0}")]
    Parse(#[from] rust_decimal::Error),
}

/// Errors that abort the batch CLI.
#[derive(Error, Debug)]
pub enum AppError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A ledger operation outside of per-row handling failed
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// The credit worker task did not complete
    #[error("credit worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: coin-wallet <operations.csv> [--relay-credits]")]
    MissingArgument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        let funds = WalletError::InsufficientFunds {
            requested: 10,
            available: 0,
        };
        assert!(funds.is_business_outcome());
        assert!(!funds.is_retryable());

        let lock = WalletError::LockUnavailable {
            resource: "wallet".to_string(),
            waited: Duration::from_secs(1),
        };
        assert!(lock.is_retryable());
        assert!(!lock.is_business_outcome());

        let store = WalletError::from(StoreError::Backend("down".to_string()));
        assert!(store.is_retryable());
        assert_eq!(store.label(), "store_failure");

        let provider = WalletError::from(LockError::Backend("down".to_string()));
        assert!(provider.is_retryable());
        assert!(!provider.is_business_outcome());
        assert_eq!(provider.label(), "lock_failure");
    }
}
