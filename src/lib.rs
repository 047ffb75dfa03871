//! # Code Pool
//!
//! A Rust library that maintains a rotating pool of short-lived 5-digit
//! numeric access codes.
//!
//! The pool generates codes with collision-checked uniqueness, retires them
//! as they approach expiry, prunes them once they lapse, and replenishes
//! itself on a timer so consumers always have a fresh code to hand out.
//! State is persisted through a pluggable storage backend, and every
//! persistence failure is absorbed internally: the pool recovers to a valid
//! in-memory state instead of surfacing storage errors to callers.
//!
//! ## Features
//!
//! - **Rotation**: a scheduled cycle that prunes, replenishes, and retires
//!   codes; lighter maintenance and pruning passes run between cycles
//! - **Emergency fallback**: `next_code` never fails — a dry pool
//!   synthesizes an emergency code on the spot
//! - **Grace-window pruning**: a just-used code survives expiry briefly so
//!   its statistics aren't erased out from under a consumer
//! - **Pluggable storage**: in-memory and JSON-file backends included, or
//!   implement [`CodeStore`] yourself
//! - **Deterministic testing**: the clock and the raw code generator are
//!   both injectable
//! - **Snapshots**: versioned JSON export/import for backup and restore
//!
//! ## Quick Start
//!
//! ```rust
//! use code_pool::{CodePoolManager, PoolError};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Build a manager on the default in-memory backend. Bootstrapping
//! // seeds an initial pool when no persisted state exists.
//! let manager = CodePoolManager::builder().build_and_bootstrap().await;
//!
//! // Hand a code to a consumer. This always succeeds.
//! let record = manager.next_code().await;
//! println!("your code: {}", record.code);
//!
//! // Later, check the code and record its consumption.
//! match manager.validate_code(&record.code).await {
//!     Ok(validation) => {
//!         println!("valid for {:?} more", validation.remaining);
//!         manager.mark_used(&record.code).await;
//!     }
//!     Err(PoolError::Expired) => println!("code expired, ask for a new one"),
//!     Err(e) => println!("rejected: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Scheduled maintenance
//!
//! ```rust,no_run
//! use code_pool::{CodePoolManager, PoolScheduler};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let manager = Arc::new(CodePoolManager::builder().build_and_bootstrap().await);
//!
//! // Rotation, maintenance, and pruning loops with periods from the
//! // manager's configuration.
//! let scheduler = PoolScheduler::spawn(Arc::clone(&manager));
//!
//! // ... serve codes ...
//! scheduler.shutdown();
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`CodePoolManager`]: owns the record list and implements the whole
//!   lifecycle; constructed explicitly and shared via `Arc`, never global
//! - [`CodeStore`]: the storage port — a passive serialization slot with no
//!   business logic
//! - [`clock::Clock`]: the time port; [`clock::ManualClock`] drives tests
//! - [`PoolScheduler`]: the three timer loops over a shared manager
//! - [`PoolError`]: the error taxonomy; validation failures are ordinary
//!   `Err` values, storage failures never escape the manager

pub mod pool;

// Re-export commonly used types
pub use pool::{
    clock, scheduler, storage, CodePoolManager, CodePoolManagerBuilder, CodeRecord, CodeStatus,
    CodeValidation, ConfigPreset, PoolConfig, PoolError, PoolScheduler, PoolSnapshot, PoolStats,
    RotationReport,
};

pub use pool::{CodeStore, StorageStats};

#[cfg(feature = "memory-storage")]
pub use pool::MemoryStore;

#[cfg(feature = "metrics")]
pub use pool::metrics;
