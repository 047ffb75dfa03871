//! JSON file storage backend.
//!
//! Persists the record list as a single JSON document on disk, the closest
//! durable equivalent of a key-value blob slot. Writes go through a
//! temp-file rename so a crash mid-write cannot leave a torn document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{CodeStore, StorageStats};
use crate::pool::error::PoolError;
use crate::pool::record::CodeRecord;

#[derive(Debug, Serialize, Deserialize)]
struct FileSlot {
    records: Vec<CodeRecord>,
    saved_at_ms: i64,
}

/// Storage backend that keeps the pool in a JSON file.
///
/// A missing file reads as an empty slot. A corrupt file reads as
/// `StorageUnavailable`, which the manager absorbs by re-seeding; the next
/// save overwrites the corrupt document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file path. The file and its
    /// parent directory need not exist yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_slot(&self) -> Result<Option<FileSlot>, PoolError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PoolError::StorageUnavailable(e.to_string())),
        };
        let slot = serde_json::from_slice(&bytes)
            .map_err(|e| PoolError::StorageUnavailable(format!("corrupt slot file: {e}")))?;
        Ok(Some(slot))
    }
}

#[async_trait]
impl CodeStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Vec<CodeRecord>>, PoolError> {
        Ok(self.read_slot().await?.map(|slot| slot.records))
    }

    async fn save(&self, records: &[CodeRecord], saved_at_ms: i64) -> Result<(), PoolError> {
        let slot = FileSlot {
            records: records.to_vec(),
            saved_at_ms,
        };
        let bytes = serde_json::to_vec_pretty(&slot)
            .map_err(|e| PoolError::StorageUnavailable(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PoolError::StorageUnavailable(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PoolError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn last_saved_at(&self) -> Result<Option<i64>, PoolError> {
        Ok(self.read_slot().await?.map(|slot| slot.saved_at_ms))
    }

    async fn stats(&self) -> Result<StorageStats, PoolError> {
        let total_records = self
            .read_slot()
            .await?
            .map_or(0, |slot| slot.records.len());
        Ok(StorageStats {
            total_records,
            backend_info: format!("JSON file storage at {}", self.path.display()),
        })
    }

    async fn init(&self) -> Result<(), PoolError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PoolError::StorageUnavailable(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::record::CodeStatus;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("code-pool-{name}-{}.json", std::process::id()))
    }

    fn sample_records() -> Vec<CodeRecord> {
        vec![CodeRecord::new(
            "54321".to_string(),
            100,
            5_000,
            CodeStatus::Active,
        )]
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() -> Result<(), PoolError> {
        let store = JsonFileStore::new(temp_path("missing"));
        assert!(store.load().await?.is_none());
        assert!(store.last_saved_at().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() -> Result<(), PoolError> {
        let path = temp_path("round-trip");
        let store = JsonFileStore::new(&path);
        let records = sample_records();

        store.save(&records, 9_000).await?;
        assert_eq!(store.load().await?.unwrap(), records);
        assert_eq!(store.last_saved_at().await?, Some(9_000));
        assert_eq!(store.stats().await?.total_records, 1);

        tokio::fs::remove_file(&path).await.ok();
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_unavailable() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        let result = store.load().await;
        assert!(matches!(result, Err(PoolError::StorageUnavailable(_))));

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_init_creates_parent_dir() -> Result<(), PoolError> {
        let dir = std::env::temp_dir().join(format!("code-pool-init-{}", std::process::id()));
        let store = JsonFileStore::new(dir.join("pool.json"));

        store.init().await?;
        store.save(&sample_records(), 1_000).await?;
        assert!(store.load().await?.is_some());

        tokio::fs::remove_dir_all(&dir).await.ok();
        Ok(())
    }
}
