//! # Coin Wallet
//!
//! A single wallet whose balance is whole units plus a concrete set of coins
//! for the fractional part. Credits mint the fewest coins for their sub-unit
//! part; debits remove the fewest held coins that make exact change and
//! report which ones were taken.
//!
//! ## Design Principles
//!
//! - **Exact amounts**: values are split into `(whole, sub)` units, truncating
//!   anything finer than one sub-unit
//! - **Fixed coin table**: 50, 20, 10, 5, 2 and 1 sub-units, 100 per whole unit
//! - **Lease-locked mutation**: every read and write of the balance runs under
//!   one distributed lease, so independent processes never interleave
//! - **No partial writes**: a failed operation leaves the stored balance as it was
//!
//! ## Example
//!
//! ```no_run
//! use coin_wallet::{Amount, LedgerConfig, MemoryLockProvider, MemoryStore, WalletLedger};
//! use std::str::FromStr;
//! use std::sync::Arc;
//!
//! # async fn example() -> coin_wallet::Result<()> {
//! let ledger = WalletLedger::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryLockProvider::new()),
//!     LedgerConfig::default(),
//! );
//! let credited = ledger.credit(Amount::from_str("10.30").unwrap()).await?;
//! assert_eq!(credited.minted.get(20), Some(1));
//! let removed = ledger.debit(Amount::from_str("0.20").unwrap()).await?;
//! assert_eq!(removed.coins.get(20), Some(1));
//! # Ok(())
//! # }
//! ```

pub mod amount;
pub mod batch;
pub mod coins;
pub mod config;
pub mod denomination;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod operation;
pub mod relay;
pub mod snapshot;
pub mod store;

pub use amount::Amount;
pub use batch::{BatchRunner, BatchSummary};
pub use coins::CoinQuantities;
pub use config::LedgerConfig;
pub use denomination::{solve_bounded, solve_unbounded, NoExactCombination, DENOMINATIONS};
pub use error::{AmountError, AppError, LockError, RelayError, Result, StoreError, WalletError};
pub use ledger::{apply_credit, plan_debit, CreditResult, MutationResult, WalletLedger};
pub use lock::{acquire_lease, LeaseGuard, LeaseToken, LockProvider, MemoryLockProvider};
pub use operation::{OperationRecord, WalletOperation};
pub use relay::{credit_channel, CreditIntent, CreditRelay, CreditWorker, WorkerStats};
pub use snapshot::BalanceSnapshot;
pub use store::{BalanceStore, KeyValueStore, MemoryStore};
