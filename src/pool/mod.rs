// Core architecture components
mod config;
mod error;
mod manager;
mod manager_builder;
mod record;
mod snapshot;

// Ports and scheduling
pub mod clock;
pub mod scheduler;
pub mod storage;

// Metrics (optional feature)
#[cfg(feature = "metrics")]
pub mod metrics;

// Core components exports
pub use config::{ConfigPreset, PoolConfig};
pub use error::PoolError;
pub use manager::{CodeGeneratorFn, CodePoolManager, CodeValidation, PoolStats, RotationReport};
pub use manager_builder::CodePoolManagerBuilder;
pub use record::{CodeRecord, CodeStatus};
pub use snapshot::{PoolSnapshot, SNAPSHOT_VERSION};

// Port and scheduling exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::PoolScheduler;
#[cfg(feature = "memory-storage")]
pub use storage::MemoryStore;
pub use storage::{CodeStore, StorageStats};

// Metrics exports (optional feature)
#[cfg(feature = "metrics")]
pub use metrics::{
    InMemoryMetricsCollector, MetricEvent, MetricsCollector, NoOpMetricsCollector, PoolMetrics,
};
