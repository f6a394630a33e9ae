//! The wallet balance-mutation engine.
//!
//! Every operation, reads included, runs inside the wallet lease:
//! acquire, load the snapshot, compute the next one, store it, release.
//! The arithmetic lives in [`apply_credit`] and [`plan_debit`], which do no
//! I/O; [`WalletLedger`] wraps them in the locking protocol.

use crate::amount::Amount;
use crate::coins::CoinQuantities;
use crate::config::LedgerConfig;
use crate::denomination::{solve_bounded, solve_unbounded, DENOMINATIONS};
use crate::error::{AmountError, Result, WalletError};
use crate::lock::{acquire_lease, LeaseGuard, LockProvider};
use crate::snapshot::BalanceSnapshot;
use crate::store::{BalanceStore, KeyValueStore};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// What a successful debit removed from the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    /// Amount actually removed. Exceeds the request when rounded up.
    pub removed: Amount,

    /// Coins taken from the wallet.
    pub coins: CoinQuantities,

    /// `true` if exact change was unavailable and the debit was rounded up
    /// to the next whole unit.
    pub rounded_up: bool,
}

/// What a successful credit added to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditResult {
    /// Balance after the credit.
    pub balance: BalanceSnapshot,

    /// Coins minted for the sub-unit part.
    pub minted: CoinQuantities,
}

/// Snapshot after crediting `amount`, and the coins minted for it.
///
/// The sub-unit part is minted as the fewest coins from an unlimited supply.
pub fn apply_credit(
    snapshot: &BalanceSnapshot,
    amount: Amount,
) -> Result<(BalanceSnapshot, CoinQuantities)> {
    let minted = solve_unbounded(&DENOMINATIONS, amount.sub_units())
        .map_err(|e| WalletError::NoExactCombination { target: e.target })?;
    let minted = tally(&minted);

    let whole_units = snapshot
        .whole_units
        .checked_add(amount.whole_units())
        .ok_or(AmountError::Overflow)?;
    let coins = snapshot
        .coins
        .checked_add(&minted)
        .ok_or(AmountError::Overflow)?;

    Ok((BalanceSnapshot::new(whole_units, coins), minted))
}

fn tally(coins: &[u32]) -> CoinQuantities {
    // Safety: the solvers only return coins drawn from DENOMINATIONS
    CoinQuantities::from_coins(coins).expect("solver returns table denominations")
}

/// Snapshot after debiting `amount`, and what was removed.
///
/// Whole units are never rounded: asking for more than is held fails with
/// `InsufficientFunds`. If the held coins cannot make the sub-unit part
/// exactly and at least one more whole unit is held than requested, the
/// debit becomes `(whole + 1, 0)` instead.
pub fn plan_debit(
    snapshot: &BalanceSnapshot,
    amount: Amount,
) -> Result<(BalanceSnapshot, MutationResult)> {
    if amount.whole_units() > snapshot.whole_units {
        return Err(WalletError::InsufficientFunds {
            requested: amount.whole_units(),
            available: snapshot.whole_units,
        });
    }

    let held = snapshot.coins.counts();
    let (removed, coins, rounded_up) =
        match solve_bounded(&DENOMINATIONS, &held, amount.sub_units()) {
            Ok(coins) => (amount, tally(&coins), false),
            Err(_) if snapshot.whole_units > amount.whole_units() => {
                // sub-units are non-zero here: a zero target always solves
                (
                    Amount::whole(amount.whole_units() + 1),
                    CoinQuantities::EMPTY,
                    true,
                )
            }
            Err(e) => return Err(WalletError::NoExactCombination { target: e.target }),
        };

    let next = BalanceSnapshot::new(
        snapshot.whole_units - removed.whole_units(),
        snapshot.coins - coins,
    );
    let result = MutationResult {
        removed,
        coins,
        rounded_up,
    };
    Ok((next, result))
}

/// The single wallet, shared by every caller in the process.
///
/// Holds no balance state itself; the store is the source of truth and the
/// lock provider serializes access to it across processes.
pub struct WalletLedger {
    store: BalanceStore,
    locks: Arc<dyn LockProvider>,
    config: LedgerConfig,
}

impl WalletLedger {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        locks: Arc<dyn LockProvider>,
        config: LedgerConfig,
    ) -> Self {
        WalletLedger {
            store: BalanceStore::new(backend, config.wallet_key.clone()),
            locks,
            config,
        }
    }

    /// Current balance, read under the lease so no write is observed half done.
    pub async fn get_balance(&self) -> Result<BalanceSnapshot> {
        let _lease = self.lock().await?;
        Ok(self.store.load().await?)
    }

    /// Adds `amount` to the wallet.
    ///
    /// The ledger applies exactly what it is given; callers that may resend a
    /// credit must deduplicate before calling.
    pub async fn credit(&self, amount: Amount) -> Result<CreditResult> {
        let _lease = self.lock().await?;

        let current = self.store.load().await?;
        if amount.is_zero() {
            debug!("Credit of zero leaves the balance at {}", current.total());
            return Ok(CreditResult {
                balance: current,
                minted: CoinQuantities::EMPTY,
            });
        }

        let (next, minted) = apply_credit(&current, amount)?;
        self.store.save(&next).await?;

        info!(
            "Credited {} (coins {}): balance {} -> {}",
            amount,
            minted,
            current.total(),
            next.total()
        );
        Ok(CreditResult {
            balance: next,
            minted,
        })
    }

    /// Removes `amount` from the wallet, possibly rounded up to a whole unit.
    pub async fn debit(&self, amount: Amount) -> Result<MutationResult> {
        let _lease = self.lock().await?;

        let current = self.store.load().await?;
        let (next, result) = match plan_debit(&current, amount) {
            Ok(planned) => planned,
            Err(e) => {
                warn!("Debit of {} rejected: {}", amount, e);
                return Err(e);
            }
        };

        if result.rounded_up {
            warn!(
                "Exact change for {} unavailable, rounding debit up to {}",
                amount, result.removed
            );
        }

        self.store.save(&next).await?;

        info!(
            "Debited {} (coins {}): balance {} -> {}",
            result.removed,
            result.coins,
            current.total(),
            next.total()
        );
        Ok(result)
    }

    async fn lock(&self) -> Result<LeaseGuard> {
        let guard = acquire_lease(
            &self.locks,
            &self.config.wallet_key,
            self.config.lease,
            self.config.acquire_timeout,
            self.config.retry_interval,
        )
        .await?;

        if !guard.is_acquired() {
            warn!(
                "Lease on '{}' not granted within {:?}",
                guard.resource(),
                self.config.acquire_timeout
            );
            return Err(WalletError::LockUnavailable {
                resource: self.config.wallet_key.clone(),
                waited: self.config.acquire_timeout,
            });
        }
        Ok(guard)
    }
}
