//! Ledger configuration.

use std::time::Duration;

/// Store key and lock resource shared by every process touching the wallet.
pub const DEFAULT_WALLET_KEY: &str = "wallet";

/// Long enough for one read-modify-write round trip to the store, short
/// enough that a crashed holder frees the wallet quickly.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(30);

pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Pending credits buffered by the relay before `submit` waits.
pub const DEFAULT_RELAY_CAPACITY: usize = 100;

/// Settings for [`WalletLedger`](crate::WalletLedger) and the credit relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Key of the snapshot in the store, also the lock resource.
    pub wallet_key: String,

    /// Lease requested on every acquisition.
    pub lease: Duration,

    /// Longest wait for a contended lease before giving up.
    pub acquire_timeout: Duration,

    /// Pause between acquisition attempts.
    pub retry_interval: Duration,

    pub relay_capacity: usize,
}

impl LedgerConfig {
    pub fn with_wallet_key(mut self, key: impl Into<String>) -> Self {
        self.wallet_key = key.into();
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_relay_capacity(mut self, capacity: usize) -> Self {
        self.relay_capacity = capacity.max(1);
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            wallet_key: DEFAULT_WALLET_KEY.to_string(),
            lease: DEFAULT_LEASE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            relay_capacity: DEFAULT_RELAY_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.wallet_key, "wallet");
        assert_eq!(config.lease, Duration::from_secs(30));
        assert_eq!(config.relay_capacity, 100);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LedgerConfig::default()
            .with_wallet_key("test-wallet")
            .with_acquire_timeout(Duration::from_millis(20))
            .with_relay_capacity(0);
        assert_eq!(config.wallet_key, "test-wallet");
        assert_eq!(config.acquire_timeout, Duration::from_millis(20));
        // mpsc channels need room for at least one message
        assert_eq!(config.relay_capacity, 1);
    }
}
