//! Storage port for code pool persistence.
//!
//! The pool persists its full record list as one unit through a single
//! named slot, plus a secondary last-update timestamp slot. Backends carry
//! no business logic: they serialize what they are given and hand back what
//! they have, or report `StorageUnavailable`.
//!
//! The manager treats every storage failure as recoverable. A backend that
//! is down makes persistence a no-op from the caller's point of view; it
//! never crashes a code operation.

use async_trait::async_trait;

use crate::pool::error::PoolError;
use crate::pool::record::CodeRecord;

#[cfg(feature = "memory-storage")]
mod memory;
#[cfg(feature = "memory-storage")]
pub use memory::MemoryStore;

#[cfg(feature = "json-storage")]
mod json_file;
#[cfg(feature = "json-storage")]
pub use json_file::JsonFileStore;

/// Statistics about a storage backend.
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Number of code records currently persisted.
    pub total_records: usize,
    /// Additional backend-specific information.
    pub backend_info: String,
}

/// Abstract storage backend for the code pool.
///
/// Implementations must be safe to call concurrently; the manager may save
/// from a scheduled rotation while a consumer-triggered save is in flight.
///
/// # Example implementation
///
/// ```rust
/// use code_pool::storage::{CodeStore, StorageStats};
/// use code_pool::pool::CodeRecord;
/// use code_pool::PoolError;
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use tokio::sync::RwLock;
///
/// #[derive(Default)]
/// struct VecStore {
///     slot: Arc<RwLock<Option<(Vec<CodeRecord>, i64)>>>,
/// }
///
/// #[async_trait]
/// impl CodeStore for VecStore {
///     async fn load(&self) -> Result<Option<Vec<CodeRecord>>, PoolError> {
///         Ok(self.slot.read().await.as_ref().map(|(records, _)| records.clone()))
///     }
///
///     async fn save(&self, records: &[CodeRecord], saved_at_ms: i64) -> Result<(), PoolError> {
///         *self.slot.write().await = Some((records.to_vec(), saved_at_ms));
///         Ok(())
///     }
///
///     async fn last_saved_at(&self) -> Result<Option<i64>, PoolError> {
///         Ok(self.slot.read().await.as_ref().map(|(_, at)| *at))
///     }
///
///     async fn stats(&self) -> Result<StorageStats, PoolError> {
///         let records = self.slot.read().await.as_ref().map_or(0, |(r, _)| r.len());
///         Ok(StorageStats { total_records: records, backend_info: "vec".to_string() })
///     }
/// }
/// ```
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Loads the persisted record list from the primary slot.
    ///
    /// Returns `Ok(None)` when nothing has ever been saved. A present but
    /// unparsable slot is a backend's choice: report `StorageUnavailable`
    /// or `Ok(None)`; the manager falls back to a seeded pool either way.
    async fn load(&self) -> Result<Option<Vec<CodeRecord>>, PoolError>;

    /// Replaces the primary slot with the given record list and stamps the
    /// last-update slot with `saved_at_ms`.
    async fn save(&self, records: &[CodeRecord], saved_at_ms: i64) -> Result<(), PoolError>;

    /// Reads the last-update timestamp slot.
    async fn last_saved_at(&self) -> Result<Option<i64>, PoolError>;

    /// Returns statistics about the backend for monitoring and debugging.
    async fn stats(&self) -> Result<StorageStats, PoolError>;

    /// Optional backend initialization hook, called once at build time.
    async fn init(&self) -> Result<(), PoolError> {
        Ok(())
    }
}
