//! In-memory storage backend.
//!
//! Holds the persisted slot in process memory behind a tokio `RwLock`.
//! Nothing survives a restart, which makes it the right backend for tests
//! and for deployments that are happy to re-seed on boot.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CodeStore, StorageStats};
use crate::pool::error::PoolError;
use crate::pool::record::CodeRecord;

#[derive(Debug, Default)]
struct Slot {
    records: Option<Vec<CodeRecord>>,
    saved_at_ms: Option<i64>,
}

/// A simple in-memory storage implementation for testing and
/// single-instance use.
///
/// # Example
///
/// ```rust
/// use code_pool::storage::{CodeStore, MemoryStore};
///
/// # async fn example() -> Result<(), code_pool::PoolError> {
/// let store = MemoryStore::new();
/// assert!(store.load().await?.is_none());
///
/// store.save(&[], 1_000).await?;
/// assert_eq!(store.last_saved_at().await?, Some(1_000));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Arc<RwLock<Slot>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn load(&self) -> Result<Option<Vec<CodeRecord>>, PoolError> {
        let slot = self.slot.read().await;
        Ok(slot.records.clone())
    }

    async fn save(&self, records: &[CodeRecord], saved_at_ms: i64) -> Result<(), PoolError> {
        let mut slot = self.slot.write().await;
        slot.records = Some(records.to_vec());
        slot.saved_at_ms = Some(saved_at_ms);
        Ok(())
    }

    async fn last_saved_at(&self) -> Result<Option<i64>, PoolError> {
        let slot = self.slot.read().await;
        Ok(slot.saved_at_ms)
    }

    async fn stats(&self) -> Result<StorageStats, PoolError> {
        let slot = self.slot.read().await;
        Ok(StorageStats {
            total_records: slot.records.as_ref().map_or(0, Vec::len),
            backend_info: "In-memory slot storage".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::record::CodeStatus;

    fn sample_records() -> Vec<CodeRecord> {
        vec![
            CodeRecord::new("11111".to_string(), 0, 1_000, CodeStatus::Active),
            CodeRecord::new("22222".to_string(), 0, 2_000, CodeStatus::Retiring),
        ]
    }

    #[tokio::test]
    async fn test_empty_store_loads_none() -> Result<(), PoolError> {
        let store = MemoryStore::new();
        assert!(store.load().await?.is_none());
        assert!(store.last_saved_at().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() -> Result<(), PoolError> {
        let store = MemoryStore::new();
        let records = sample_records();

        store.save(&records, 5_000).await?;

        let loaded = store.load().await?.unwrap();
        assert_eq!(loaded, records);
        assert_eq!(store.last_saved_at().await?, Some(5_000));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_replaces_wholesale() -> Result<(), PoolError> {
        let store = MemoryStore::new();
        store.save(&sample_records(), 1_000).await?;
        store.save(&[], 2_000).await?;

        let loaded = store.load().await?.unwrap();
        assert!(loaded.is_empty());
        assert_eq!(store.last_saved_at().await?, Some(2_000));
        Ok(())
    }

    #[tokio::test]
    async fn test_stats() -> Result<(), PoolError> {
        let store = MemoryStore::new();
        let stats = store.stats().await?;
        assert_eq!(stats.total_records, 0);
        assert!(stats.backend_info.contains("In-memory"));

        store.save(&sample_records(), 1_000).await?;
        let stats = store.stats().await?;
        assert_eq!(stats.total_records, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_saves() -> Result<(), PoolError> {
        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.save(&[], i as i64).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert!(store.last_saved_at().await?.is_some());
        Ok(())
    }
}
