//! Key-value storage of the balance snapshot.
//!
//! The backend is a plain byte-string store; this module owns the encoding
//! of [`BalanceSnapshot`] on top of it.

use crate::error::StoreError;
use crate::snapshot::BalanceSnapshot;
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A shared get/set byte store, e.g. a Redis database.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Returns `false` if the backend did not apply the write.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError>;
}

/// Process-local store used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(true)
    }
}

/// Typed access to the single wallet snapshot.
#[derive(Clone)]
pub struct BalanceStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl BalanceStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        BalanceStore {
            backend,
            key: key.into(),
        }
    }

    /// Reads the snapshot, or the zero snapshot if none was ever written.
    pub async fn load(&self) -> Result<BalanceSnapshot, StoreError> {
        let bytes = self.backend.get(&self.key).await?;
        BalanceSnapshot::decode(bytes.as_deref())
    }

    pub async fn save(&self, snapshot: &BalanceSnapshot) -> Result<(), StoreError> {
        let bytes = snapshot.encode()?;
        if !self.backend.set(&self.key, bytes).await? {
            return Err(StoreError::WriteRejected {
                key: self.key.clone(),
            });
        }
        debug!("Stored snapshot under '{}': total {}", self.key, snapshot.total());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::CoinQuantities;

    struct RejectingStore;

    #[async_trait]
    impl KeyValueStore for RejectingStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_missing_key_loads_zero() {
        let store = BalanceStore::new(Arc::new(MemoryStore::new()), "wallet");
        assert_eq!(store.load().await.unwrap(), BalanceSnapshot::zero());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let backend = Arc::new(MemoryStore::new());
        let store = BalanceStore::new(backend.clone(), "wallet");
        let snapshot = BalanceSnapshot::new(4, CoinQuantities::from_counts([1, 0, 0, 0, 0, 2]));

        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await.unwrap(), snapshot);

        // Raw bytes sit under the configured key only
        assert!(backend.get("wallet").await.unwrap().is_some());
        assert!(backend.get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_write_is_an_error() {
        let store = BalanceStore::new(Arc::new(RejectingStore), "wallet");
        let err = store.save(&BalanceSnapshot::zero()).await.unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { ref key } if key == "wallet"));
    }
}
