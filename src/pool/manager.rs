use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::clock::Clock;
use super::config::PoolConfig;
use super::error::PoolError;
use super::record::{CodeRecord, CodeStatus};
use super::snapshot::PoolSnapshot;
use super::storage::CodeStore;

#[cfg(feature = "metrics")]
use super::metrics::{MetricEvent, MetricsCollector};
#[cfg(feature = "memory-storage")]
use super::storage::MemoryStore;
#[cfg(feature = "memory-storage")]
use super::CodePoolManagerBuilder;

/// Signature of the raw code generator: returns a candidate in
/// `[10000, 99999]`. Injectable through the builder so collision and
/// retry-exhaustion behavior can be driven deterministically.
pub type CodeGeneratorFn = Box<dyn Fn() -> u32 + Send + Sync>;

/// Successful outcome of [`CodePoolManager::validate_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeValidation {
    /// Time left until the code expires.
    pub remaining: Duration,
    /// How many times the code has been handed out or consumed so far.
    pub uses: u32,
}

/// Counts describing the pool's current composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total records held, regardless of status or expiry.
    pub total: usize,
    /// Unexpired records with `Active` status.
    pub active: usize,
    /// Records with `Retiring` status.
    pub retiring: usize,
    /// Records with `Emergency` status.
    pub emergency: usize,
    /// Sum of `uses` across all records.
    pub total_uses: u64,
}

/// Outcome of one [`CodePoolManager::rotate`] cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Records removed by the pruning pass.
    pub pruned: usize,
    /// Records generated to close the active-count deficit.
    pub generated: usize,
    /// `Active` records flipped to `Retiring`.
    pub retired: usize,
}

/// Owns a rotating pool of short-lived numeric access codes.
///
/// The manager holds the record list behind a single async mutex; every
/// operation takes the lock for its whole critical section, so scheduled
/// rotation, pruning, and consumer-driven `next_code` calls serialize
/// against each other.
///
/// Persistence is best-effort: storage failures are logged and absorbed,
/// and the manager always keeps a valid in-memory pool. No operation fails
/// because a backend is down, and `next_code` never fails at all — when the
/// pool is dry it synthesizes an emergency record instead.
///
/// Construct instances explicitly (via [`CodePoolManager::builder`]) and
/// hand them to consumers; there is deliberately no global instance.
pub struct CodePoolManager<S: CodeStore> {
    config: PoolConfig,
    clock: Arc<dyn Clock>,
    store: Arc<S>,
    generator: CodeGeneratorFn,
    records: Mutex<Vec<CodeRecord>>,
    #[cfg(feature = "metrics")]
    metrics: Arc<dyn MetricsCollector>,
}

#[cfg(feature = "memory-storage")]
impl CodePoolManager<MemoryStore> {
    /// Creates a new `CodePoolManagerBuilder` to construct a manager.
    ///
    /// The builder defaults to [`MemoryStore`]; provide a different backend
    /// with `.with_store()`.
    pub fn builder() -> CodePoolManagerBuilder<MemoryStore> {
        CodePoolManagerBuilder::new()
    }
}

impl<S: CodeStore + 'static> CodePoolManager<S> {
    /// Internal constructor used by the builder.
    #[cfg(feature = "metrics")]
    pub(crate) fn new(
        store: Arc<S>,
        config: PoolConfig,
        clock: Arc<dyn Clock>,
        generator: CodeGeneratorFn,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            config,
            clock,
            store,
            generator,
            records: Mutex::new(Vec::new()),
            metrics,
        }
    }

    /// Internal constructor used by the builder (non-metrics version).
    #[cfg(not(feature = "metrics"))]
    pub(crate) fn new(
        store: Arc<S>,
        config: PoolConfig,
        clock: Arc<dyn Clock>,
        generator: CodeGeneratorFn,
    ) -> Self {
        Self {
            config,
            clock,
            store,
            generator,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Loads persisted records, falling back to a deterministic seeded set.
    ///
    /// Any storage failure (backend down, slot unparsable) is logged and
    /// absorbed; the manager comes up with the seeded pool instead. The
    /// resulting state is persisted best-effort.
    pub async fn bootstrap(&self) {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        match self.store.load().await {
            Ok(Some(loaded)) if !loaded.is_empty() => {
                let saved_at = self.store.last_saved_at().await.ok().flatten();
                tracing::debug!(count = loaded.len(), ?saved_at, "loaded persisted code pool");
                *records = loaded;
                return;
            }
            Ok(_) => {
                tracing::debug!("no persisted pool, seeding initial codes");
            }
            Err(e) => {
                tracing::warn!("failed to load persisted pool, seeding instead: {e}");
            }
        }

        *records = self.seed_records(now);
        self.persist(&records, now).await;
    }

    /// Produces `count` new `Active` records, appends them to the pool,
    /// trims overflow, and persists. Returns the newly created records.
    ///
    /// Codes are drawn uniformly from `[10000, 99999]` and checked for
    /// uniqueness against every held code, with up to
    /// `max_generation_attempts` retries per code. When retries are
    /// exhausted the last candidate is accepted even if it collides; the
    /// bound is configuration, not a hidden constant.
    ///
    /// Expiries are staggered by `stagger` per index so a batch does not
    /// expire simultaneously.
    pub async fn generate_codes(&self, count: usize) -> Vec<CodeRecord> {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        let created = self.generate_into(&mut records, count, now);
        self.trim_in(&mut records);
        self.persist(&records, now).await;

        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::CodesGenerated {
                count: created.len(),
            })
            .await;

        created
    }

    /// Returns all unexpired `Active` records, newest first.
    ///
    /// Pure query; mutates nothing. `Retiring` and `Emergency` records are
    /// excluded even when still usable, so the result reflects what the
    /// pool would hand out next.
    pub async fn active_codes(&self) -> Vec<CodeRecord> {
        let now = self.clock.now_ms();
        let records = self.records.lock().await;

        let mut active: Vec<CodeRecord> = records
            .iter()
            .filter(|r| r.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        active
    }

    /// Selects a code for a consumer, always succeeding.
    ///
    /// Among active codes the least-used wins, ties broken by most recent
    /// `generated_at`. The winner's `uses` is incremented and the pool
    /// persisted, so this is a query with a side effect, not idempotent.
    ///
    /// When no active code exists, an unexpired `Emergency` record is
    /// served instead, if one is held. A fresh `Emergency` record is
    /// synthesized, with `uses` already at 1, only when the pool holds no
    /// valid record of either status.
    pub async fn next_code(&self) -> CodeRecord {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        let chosen = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_active_at(now))
            .min_by_key(|(_, r)| (r.uses, std::cmp::Reverse(r.generated_at)))
            .map(|(i, _)| i)
            .or_else(|| {
                records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.status == CodeStatus::Emergency && !r.is_expired(now))
                    .min_by_key(|(_, r)| (r.uses, std::cmp::Reverse(r.generated_at)))
                    .map(|(i, _)| i)
            });

        let result = match chosen {
            Some(i) => {
                records[i].uses += 1;
                records[i].clone()
            }
            None => {
                let code = self.draw_code(&records);
                let mut record = CodeRecord::new(
                    code,
                    now,
                    now + self.config.emergency_ttl.as_millis() as i64,
                    CodeStatus::Emergency,
                );
                record.uses = 1;
                tracing::warn!(code = %record.code, "pool dry, issuing emergency code");
                records.push(record.clone());
                #[cfg(feature = "metrics")]
                self.metrics
                    .record_event(MetricEvent::EmergencyIssued)
                    .await;
                record
            }
        };

        self.persist(&records, now).await;

        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::CodeServed {
                emergency: result.status == CodeStatus::Emergency,
            })
            .await;

        result
    }

    /// Records a consumption of `code`: increments `uses` and stamps
    /// `last_used_at`, then persists. Unknown codes are a silent no-op.
    pub async fn mark_used(&self, code: &str) {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        let Some(record) = records.iter_mut().find(|r| r.code == code) else {
            return;
        };
        record.uses += 1;
        record.last_used_at = Some(now);
        self.persist(&records, now).await;
    }

    /// Checks whether `code` may be used right now.
    ///
    /// Fails with [`PoolError::NotFound`] for unknown codes,
    /// [`PoolError::Expired`] past (or exactly at) `expires_at`, and
    /// [`PoolError::Inactive`] for statuses that disallow use. On success
    /// returns the remaining time-to-live and the current use count.
    pub async fn validate_code(&self, code: &str) -> Result<CodeValidation, PoolError> {
        let now = self.clock.now_ms();
        let records = self.records.lock().await;

        let result = match records.iter().find(|r| r.code == code) {
            None => Err(PoolError::NotFound),
            Some(record) if record.is_expired(now) => Err(PoolError::Expired),
            Some(record) if !matches!(record.status, CodeStatus::Active | CodeStatus::Emergency) => {
                Err(PoolError::Inactive)
            }
            Some(record) => Ok(CodeValidation {
                remaining: Duration::from_millis((record.expires_at - now) as u64),
                uses: record.uses,
            }),
        };

        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::ValidationAttempt {
                success: result.is_ok(),
            })
            .await;

        result
    }

    /// Removes records past expiry, honoring the post-use grace window.
    /// Persists only when something was removed. Idempotent; returns the
    /// number of records dropped.
    pub async fn prune_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        let removed = self.prune_in(&mut records, now);
        if removed > 0 {
            tracing::debug!(removed, "pruned expired codes");
            self.persist(&records, now).await;
        }
        removed
    }

    /// Drops oldest-by-expiry overflow so the pool holds at most
    /// `max_codes` records. Persists only when truncation occurred.
    /// Returns the number of records dropped.
    pub async fn trim(&self) -> usize {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        let removed = self.trim_in(&mut records);
        if removed > 0 {
            self.persist(&records, now).await;
        }
        removed
    }

    /// Runs the full scheduled maintenance cycle: prune expired records,
    /// replenish the active-count deficit, flip near-expiry `Active`
    /// records to `Retiring`, and persist the final state.
    ///
    /// The deficit counts only actives that will outlast the retire pass;
    /// an active record already inside the retire horizon is about to flip
    /// to `Retiring` and cannot satisfy the minimum.
    pub async fn rotate(&self) -> RotationReport {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;
        let mut report = RotationReport::default();
        let horizon = self.config.retire_horizon.as_millis() as i64;

        report.pruned = self.prune_in(&mut records, now);

        let durable = records
            .iter()
            .filter(|r| r.is_active_at(now) && !r.within_retire_horizon(now, horizon))
            .count();
        if durable < self.config.min_active_codes {
            let deficit = self.config.min_active_codes - durable;
            report.generated = self.generate_into(&mut records, deficit, now).len();
            self.trim_in(&mut records);
        }

        for record in records.iter_mut() {
            if record.status == CodeStatus::Active
                && !record.is_expired(now)
                && record.within_retire_horizon(now, horizon)
            {
                record.status = CodeStatus::Retiring;
                report.retired += 1;
            }
        }

        self.persist(&records, now).await;
        tracing::debug!(
            pruned = report.pruned,
            generated = report.generated,
            retired = report.retired,
            "rotation cycle complete"
        );

        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::RotationCompleted {
                pruned: report.pruned,
                generated: report.generated,
                retired: report.retired,
            })
            .await;

        report
    }

    /// Lighter-weight check run between rotations: replenishes the active
    /// count to the configured minimum without touching retiring status.
    /// Returns the number of codes generated.
    pub async fn maintain(&self) -> usize {
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        let active = records.iter().filter(|r| r.is_active_at(now)).count();
        if active >= self.config.min_active_codes {
            return 0;
        }

        let deficit = self.config.min_active_codes - active;
        let generated = self.generate_into(&mut records, deficit, now).len();
        self.trim_in(&mut records);
        self.persist(&records, now).await;

        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::CodesGenerated { count: generated })
            .await;

        generated
    }

    /// Serializes the full record list as a versioned JSON snapshot.
    pub async fn export_snapshot(&self) -> String {
        let now = self.clock.now_ms();
        let records = self.records.lock().await;
        PoolSnapshot::new(records.clone(), now).to_json()
    }

    /// Replaces the in-memory pool wholesale from a snapshot payload, then
    /// prunes and persists.
    ///
    /// Fails with [`PoolError::InvalidFormat`] when the payload is not a
    /// well-formed record list; on failure the current pool is untouched.
    pub async fn import_snapshot(&self, json: &str) -> Result<(), PoolError> {
        let snapshot = PoolSnapshot::parse(json)?;
        let now = self.clock.now_ms();
        let mut records = self.records.lock().await;

        *records = snapshot.records;
        self.prune_in(&mut records, now);
        self.persist(&records, now).await;

        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::SnapshotImported {
                count: records.len(),
            })
            .await;

        Ok(())
    }

    /// Returns counts describing the pool's current composition.
    pub async fn pool_stats(&self) -> PoolStats {
        let now = self.clock.now_ms();
        let records = self.records.lock().await;

        let mut stats = PoolStats {
            total: records.len(),
            ..PoolStats::default()
        };
        for record in records.iter() {
            match record.status {
                CodeStatus::Active if !record.is_expired(now) => stats.active += 1,
                CodeStatus::Active => {}
                CodeStatus::Retiring => stats.retiring += 1,
                CodeStatus::Emergency => stats.emergency += 1,
            }
            stats.total_uses += u64::from(record.uses);
        }
        stats
    }

    /// Returns the manager's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns a reference to the storage backend.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // Internal helpers below operate on an already-locked record list so
    // compound operations (rotate, maintain) stay one critical section.

    fn seed_records(&self, now: i64) -> Vec<CodeRecord> {
        let ttl = self.config.code_ttl.as_millis() as i64;
        let stagger = self.config.stagger.as_millis() as i64;
        let mut seeded: Vec<CodeRecord> = Vec::with_capacity(self.config.min_active_codes);
        for i in 0..self.config.min_active_codes {
            let code = self.draw_code(&seeded);
            seeded.push(CodeRecord::new(
                code,
                now,
                now + ttl + i as i64 * stagger,
                CodeStatus::Active,
            ));
        }
        seeded
    }

    fn generate_into(
        &self,
        records: &mut Vec<CodeRecord>,
        count: usize,
        now: i64,
    ) -> Vec<CodeRecord> {
        let ttl = self.config.code_ttl.as_millis() as i64;
        let stagger = self.config.stagger.as_millis() as i64;
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            let code = self.draw_code(records);
            let record = CodeRecord::new(
                code,
                now,
                now + ttl + i as i64 * stagger,
                CodeStatus::Active,
            );
            records.push(record.clone());
            created.push(record);
        }
        created
    }

    /// Draws a candidate code, retrying on collision against every held
    /// code (any status) up to the configured attempt bound. On exhaustion
    /// the last candidate is accepted, duplicate or not.
    fn draw_code(&self, records: &[CodeRecord]) -> String {
        let mut candidate = (self.generator)().to_string();
        for _ in 0..self.config.max_generation_attempts {
            if !records.iter().any(|r| r.code == candidate) {
                return candidate;
            }
            candidate = (self.generator)().to_string();
        }
        tracing::debug!(
            attempts = self.config.max_generation_attempts,
            "uniqueness retries exhausted, accepting possibly-duplicate code"
        );
        candidate
    }

    fn prune_in(&self, records: &mut Vec<CodeRecord>, now: i64) -> usize {
        let grace = self.config.prune_grace.as_millis() as i64;
        let before = records.len();
        records.retain(|r| !r.prunable_at(now, grace));
        before - records.len()
    }

    fn trim_in(&self, records: &mut Vec<CodeRecord>) -> usize {
        if records.len() <= self.config.max_codes {
            return 0;
        }
        records.sort_by(|a, b| b.expires_at.cmp(&a.expires_at));
        let removed = records.len() - self.config.max_codes;
        records.truncate(self.config.max_codes);
        removed
    }

    /// Best-effort save: failures are logged and absorbed so no code
    /// operation ever surfaces a storage error.
    async fn persist(&self, records: &[CodeRecord], now: i64) {
        let result = self.store.save(records, now).await;
        #[cfg(feature = "metrics")]
        self.metrics
            .record_event(MetricEvent::StorageOperation {
                operation: "save",
                success: result.is_ok(),
            })
            .await;
        if let Err(e) = result {
            tracing::warn!("failed to persist code pool: {e}");
        }
    }
}
