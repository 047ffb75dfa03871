//! Optional metrics collection for pool operations.
//!
//! This module provides a pluggable metrics system for tracking generation,
//! hand-out, validation, and rotation activity. Collection is optional and
//! enabled via the `metrics` feature; without a configured collector the
//! manager uses [`NoOpMetricsCollector`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Events emitted by the pool manager.
#[derive(Debug, Clone)]
pub enum MetricEvent {
    /// A batch of codes was generated (by demand, maintenance, or rotation).
    CodesGenerated {
        /// Number of records created.
        count: usize,
    },
    /// A code was handed to a consumer via `next_code`.
    CodeServed {
        /// Whether the served record was a synthesized emergency code.
        emergency: bool,
    },
    /// The pool was dry and an emergency code was synthesized.
    EmergencyIssued,
    /// A `validate_code` call completed.
    ValidationAttempt {
        /// Whether the code validated successfully.
        success: bool,
    },
    /// A rotation cycle finished.
    RotationCompleted {
        /// Records removed by pruning.
        pruned: usize,
        /// Records generated to close the deficit.
        generated: usize,
        /// Records flipped to retiring.
        retired: usize,
    },
    /// A snapshot import replaced the pool.
    SnapshotImported {
        /// Records in the imported pool after pruning.
        count: usize,
    },
    /// A storage backend call completed.
    StorageOperation {
        /// Operation name (currently always `"save"`).
        operation: &'static str,
        /// Whether the backend call succeeded.
        success: bool,
    },
}

/// Aggregated counters, as reported by [`InMemoryMetricsCollector`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Total codes generated.
    pub codes_generated: u64,
    /// Total codes handed out.
    pub codes_served: u64,
    /// Emergency codes synthesized.
    pub emergency_codes: u64,
    /// Validation attempts.
    pub validation_attempts: u64,
    /// Validation failures.
    pub validation_failures: u64,
    /// Rotation cycles completed.
    pub rotations: u64,
    /// Records removed by pruning during rotations.
    pub records_pruned: u64,
    /// Storage calls that failed.
    pub storage_failures: u64,
}

/// Sink for pool metric events.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Records a single event.
    async fn record_event(&self, event: MetricEvent);
}

/// Collector that discards every event.
#[derive(Debug, Default)]
pub struct NoOpMetricsCollector;

impl NoOpMetricsCollector {
    /// Creates a new no-op collector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsCollector for NoOpMetricsCollector {
    async fn record_event(&self, _event: MetricEvent) {}
}

/// Collector that aggregates counters in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMetricsCollector {
    codes_generated: AtomicU64,
    codes_served: AtomicU64,
    emergency_codes: AtomicU64,
    validation_attempts: AtomicU64,
    validation_failures: AtomicU64,
    rotations: AtomicU64,
    records_pruned: AtomicU64,
    storage_failures: AtomicU64,
}

impl InMemoryMetricsCollector {
    /// Creates a new collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current counters.
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            codes_generated: self.codes_generated.load(Ordering::Relaxed),
            codes_served: self.codes_served.load(Ordering::Relaxed),
            emergency_codes: self.emergency_codes.load(Ordering::Relaxed),
            validation_attempts: self.validation_attempts.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            records_pruned: self.records_pruned.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl MetricsCollector for InMemoryMetricsCollector {
    async fn record_event(&self, event: MetricEvent) {
        match event {
            MetricEvent::CodesGenerated { count } => {
                self.codes_generated
                    .fetch_add(count as u64, Ordering::Relaxed);
            }
            MetricEvent::CodeServed { emergency: _ } => {
                self.codes_served.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::EmergencyIssued => {
                self.emergency_codes.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::ValidationAttempt { success } => {
                self.validation_attempts.fetch_add(1, Ordering::Relaxed);
                if !success {
                    self.validation_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            MetricEvent::RotationCompleted {
                pruned,
                generated,
                retired: _,
            } => {
                self.rotations.fetch_add(1, Ordering::Relaxed);
                self.records_pruned
                    .fetch_add(pruned as u64, Ordering::Relaxed);
                self.codes_generated
                    .fetch_add(generated as u64, Ordering::Relaxed);
            }
            MetricEvent::SnapshotImported { .. } => {}
            MetricEvent::StorageOperation { success, .. } => {
                if !success {
                    self.storage_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}
