//! Lease-based mutual exclusion across processes.
//!
//! A lease is granted for a fixed duration and identified by a token. The
//! holder releases it by dropping its [`LeaseGuard`]; a holder that never
//! does is cut off when the lease expires.

use crate::error::LockError;
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Identifies one grant of a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaseToken(pub u64);

/// A shared lease-lock service, e.g. Redlock over Redis.
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// One attempt to take the lease. `None` if someone else holds it.
    async fn try_acquire(
        &self,
        resource: &str,
        lease: Duration,
    ) -> Result<Option<LeaseToken>, LockError>;

    /// Gives up a lease. A token that no longer holds the resource is ignored.
    ///
    /// Called from `Drop`, so it must not block.
    fn release(&self, resource: &str, token: LeaseToken);
}

/// Scoped ownership of a lease; releases it when dropped.
pub struct LeaseGuard {
    provider: Arc<dyn LockProvider>,
    resource: String,
    token: Option<LeaseToken>,
}

impl LeaseGuard {
    pub fn is_acquired(&self) -> bool {
        self.token.is_some()
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.provider.release(&self.resource, token);
            debug!("Released lease on '{}'", self.resource);
        }
    }
}

/// Tries to take the lease until it is granted or `wait` has elapsed.
///
/// An ungranted guard (`is_acquired() == false`) is returned on timeout.
/// Provider errors abort immediately.
pub async fn acquire_lease(
    provider: &Arc<dyn LockProvider>,
    resource: &str,
    lease: Duration,
    wait: Duration,
    retry_interval: Duration,
) -> Result<LeaseGuard, LockError> {
    let deadline = Instant::now() + wait;

    let token = loop {
        if let Some(token) = provider.try_acquire(resource, lease).await? {
            debug!("Acquired lease on '{}' for {:?}", resource, lease);
            break Some(token);
        }
        let now = Instant::now();
        if now >= deadline {
            break None;
        }
        sleep(retry_interval.min(deadline - now)).await;
    };

    Ok(LeaseGuard {
        provider: Arc::clone(provider),
        resource: resource.to_string(),
        token,
    })
}

#[derive(Debug)]
struct Holder {
    token: LeaseToken,
    expires_at: Instant,
}

/// Process-local lease table used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryLockProvider {
    holders: Mutex<HashMap<String, Holder>>,
    next_token: AtomicU64,
}

impl MemoryLockProvider {
    pub fn new() -> Self {
        MemoryLockProvider::default()
    }

    /// Returns `true` if an unexpired lease is held on `resource`.
    pub fn is_held(&self, resource: &str) -> bool {
        let holders = self.holders.lock().unwrap_or_else(|e| e.into_inner());
        holders
            .get(resource)
            .map(|h| h.expires_at > Instant::now())
            .unwrap_or(false)
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn try_acquire(
        &self,
        resource: &str,
        lease: Duration,
    ) -> Result<Option<LeaseToken>, LockError> {
        let now = Instant::now();
        let mut holders = self.holders.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(holder) = holders.get(resource) {
            if holder.expires_at > now {
                return Ok(None);
            }
            debug!("Lease {:?} on '{}' expired", holder.token, resource);
        }

        let token = LeaseToken(self.next_token.fetch_add(1, Ordering::Relaxed) + 1);
        holders.insert(
            resource.to_string(),
            Holder {
                token,
                expires_at: now + lease,
            },
        );
        Ok(Some(token))
    }

    fn release(&self, resource: &str, token: LeaseToken) {
        let mut holders = self.holders.lock().unwrap_or_else(|e| e.into_inner());
        if holders.get(resource).map(|h| h.token) == Some(token) {
            holders.remove(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEASE: Duration = Duration::from_secs(30);
    const RETRY: Duration = Duration::from_millis(5);

    fn provider() -> (Arc<MemoryLockProvider>, Arc<dyn LockProvider>) {
        let concrete = Arc::new(MemoryLockProvider::new());
        let shared: Arc<dyn LockProvider> = concrete.clone();
        (concrete, shared)
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let (concrete, shared) = provider();

        let guard = acquire_lease(&shared, "wallet", LEASE, Duration::ZERO, RETRY)
            .await
            .unwrap();
        assert!(guard.is_acquired());
        assert!(concrete.is_held("wallet"));

        drop(guard);
        assert!(!concrete.is_held("wallet"));
    }

    #[tokio::test]
    async fn test_contended_lease_times_out_unacquired() {
        let (_concrete, shared) = provider();

        let _held = acquire_lease(&shared, "wallet", LEASE, Duration::ZERO, RETRY)
            .await
            .unwrap();
        let second = acquire_lease(&shared, "wallet", LEASE, Duration::from_millis(20), RETRY)
            .await
            .unwrap();
        assert!(!second.is_acquired());
    }

    #[tokio::test]
    async fn test_waiter_gets_lease_after_release() {
        let (_concrete, shared) = provider();

        let held = acquire_lease(&shared, "wallet", LEASE, Duration::ZERO, RETRY)
            .await
            .unwrap();

        let waiter = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                acquire_lease(&shared, "wallet", LEASE, Duration::from_secs(5), RETRY)
                    .await
                    .map(|g| g.is_acquired())
            })
        };

        sleep(Duration::from_millis(20)).await;
        drop(held);
        assert!(waiter.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_expired_lease_can_be_taken_and_stale_release_is_ignored() {
        let (concrete, shared) = provider();

        let stale = shared
            .try_acquire("wallet", Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        sleep(Duration::from_millis(20)).await;

        let fresh = shared.try_acquire("wallet", LEASE).await.unwrap().unwrap();
        assert_ne!(stale, fresh);

        shared.release("wallet", stale);
        assert!(concrete.is_held("wallet"));

        shared.release("wallet", fresh);
        assert!(!concrete.is_held("wallet"));
    }

    #[tokio::test]
    async fn test_resources_are_independent() {
        let (_concrete, shared) = provider();

        let a = shared.try_acquire("a", LEASE).await.unwrap();
        let b = shared.try_acquire("b", LEASE).await.unwrap();
        assert!(a.is_some());
        assert!(b.is_some());
    }
}
