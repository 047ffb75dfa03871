//! End-to-end lifecycle tests for the code pool.
//!
//! These exercise the public API the way a page controller would: bootstrap,
//! serve codes, validate and consume them, and let rotation reshape the pool
//! as a manually-driven clock advances.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use code_pool::clock::ManualClock;
use code_pool::{
    CodePoolManager, CodeRecord, CodeStatus, CodeStore, MemoryStore, PoolConfig, PoolError,
    PoolSnapshot,
};

const T0: i64 = 1_700_000_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn sequential_generator() -> impl Fn() -> u32 + Send + Sync {
    let next = AtomicU32::new(10_000);
    move || next.fetch_add(1, Ordering::SeqCst)
}

fn active_record(code: &str, generated_at: i64, expires_at: i64) -> CodeRecord {
    CodeRecord {
        code: code.to_string(),
        generated_at,
        expires_at,
        status: CodeStatus::Active,
        uses: 0,
        last_used_at: None,
    }
}

/// Rotation on a staggered-expiry pool: 8 active records expiring between
/// 1500s and 54000s out, clock advanced just past the first hour, then one
/// rotation. Afterwards nothing expired may remain in `Active` status and
/// at least the minimum active count holds.
#[tokio::test]
async fn rotation_scenario_with_staggered_expiries() {
    init_tracing();
    let clock = Arc::new(ManualClock::new(T0));
    let manager = CodePoolManager::builder()
        .with_clock(Arc::clone(&clock))
        .with_code_generator(sequential_generator())
        .build_and_bootstrap()
        .await;

    // Replace the seeded pool with the scenario's 8 records, expiring at
    // 1500s, 9000s, ..., 54000s past T0.
    let records: Vec<CodeRecord> = (0..8)
        .map(|i| {
            active_record(
                &format!("2000{i}"),
                T0,
                T0 + (1_500 + i * 7_500) * 1_000,
            )
        })
        .collect();
    let snapshot = PoolSnapshot {
        version: code_pool::pool::SNAPSHOT_VERSION,
        exported_at_ms: T0,
        records,
    };
    manager.import_snapshot(&snapshot.to_json()).await.unwrap();
    assert_eq!(manager.pool_stats().await.total, 8);

    clock.advance_ms(3_601_000);
    manager.rotate().await;

    let now = T0 + 3_601_000;
    for record in manager.active_codes().await {
        assert!(record.expires_at > now, "expired record left active");
        assert_eq!(record.status, CodeStatus::Active);
    }
    let stats = manager.pool_stats().await;
    assert!(stats.active >= manager.config().min_active_codes);
    // The 1500s record was expired and unused: pruned outright.
    assert!(matches!(
        manager.validate_code("20000").await,
        Err(PoolError::NotFound)
    ));
}

/// Generating 3 codes on an empty pool yields 3 distinct active records
/// with zero uses.
#[tokio::test]
async fn generate_three_on_empty_pool() {
    let manager = CodePoolManager::builder()
        .with_config(PoolConfig {
            min_active_codes: 0,
            ..PoolConfig::default()
        })
        .build_and_bootstrap()
        .await;
    assert_eq!(manager.pool_stats().await.total, 0);

    let created = manager.generate_codes(3).await;
    assert_eq!(created.len(), 3);

    let mut codes: Vec<&str> = created.iter().map(|r| r.code.as_str()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), 3, "codes must be distinct");

    for record in &created {
        assert_eq!(record.status, CodeStatus::Active);
        assert_eq!(record.uses, 0);
    }
}

/// A snapshot taken on one manager restores an equivalent pool on another.
#[tokio::test]
async fn snapshot_moves_pool_between_managers() {
    let clock = Arc::new(ManualClock::new(T0));
    let source = CodePoolManager::builder()
        .with_clock(Arc::clone(&clock))
        .with_code_generator(sequential_generator())
        .build_and_bootstrap()
        .await;
    source.next_code().await;
    source.mark_used(&source.next_code().await.code).await;

    let exported = source.export_snapshot().await;
    let expected = source.pool_stats().await;

    let target = CodePoolManager::builder()
        .with_store(Arc::new(MemoryStore::new()))
        .with_clock(Arc::clone(&clock))
        .with_config(PoolConfig {
            min_active_codes: 0,
            ..PoolConfig::default()
        })
        .build_and_bootstrap()
        .await;
    target.import_snapshot(&exported).await.unwrap();

    assert_eq!(target.pool_stats().await, expected);
    // Imported state is persisted to the target's own backend.
    let persisted = target.store().load().await.unwrap().unwrap();
    assert_eq!(persisted.len(), expected.total);
}

/// Full consumer lifecycle: serve, consume, expire, rotate, re-serve.
#[tokio::test]
async fn consumer_lifecycle_across_rotation() {
    init_tracing();
    let clock = Arc::new(ManualClock::new(T0));
    let manager = CodePoolManager::builder()
        .with_clock(Arc::clone(&clock))
        .with_code_generator(sequential_generator())
        .build_and_bootstrap()
        .await;

    let served = manager.next_code().await;
    assert_eq!(served.uses, 1);
    manager.mark_used(&served.code).await;
    assert_eq!(manager.validate_code(&served.code).await.unwrap().uses, 2);

    // Jump far past every expiry and rotate. The served code is eventually
    // gone (its post-use grace has long lapsed) and the pool is rebuilt.
    clock.advance_ms(24 * 3_600_000);
    manager.rotate().await;

    assert!(matches!(
        manager.validate_code(&served.code).await,
        Err(PoolError::NotFound)
    ));
    let fresh = manager.next_code().await;
    assert_eq!(fresh.status, CodeStatus::Active);
    assert!(manager.validate_code(&fresh.code).await.is_ok());
}

/// The pool bound holds across repeated generation bursts.
#[tokio::test]
async fn pool_never_exceeds_max_codes() {
    let clock = Arc::new(ManualClock::new(T0));
    let manager = CodePoolManager::builder()
        .with_clock(Arc::clone(&clock))
        .with_code_generator(sequential_generator())
        .build_and_bootstrap()
        .await;

    for _ in 0..5 {
        clock.advance_ms(1_000);
        manager.generate_codes(7).await;
        let stats = manager.pool_stats().await;
        assert!(stats.total <= manager.config().max_codes);
    }
}

#[cfg(feature = "json-storage")]
mod json_storage {
    use super::*;
    use code_pool::storage::JsonFileStore;

    #[tokio::test]
    async fn pool_survives_restart_via_json_file() {
        let path = std::env::temp_dir().join(format!(
            "code-pool-restart-{}.json",
            std::process::id()
        ));
        let clock = Arc::new(ManualClock::new(T0));

        let first = CodePoolManager::builder()
            .with_store(Arc::new(JsonFileStore::new(&path)))
            .with_clock(Arc::clone(&clock))
            .with_code_generator(sequential_generator())
            .build_and_bootstrap()
            .await;
        let served = first.next_code().await;
        let expected = first.pool_stats().await;
        drop(first);

        // A second manager over the same file picks up where we left off.
        let second = CodePoolManager::builder()
            .with_store(Arc::new(JsonFileStore::new(&path)))
            .with_clock(clock)
            .with_code_generator(sequential_generator())
            .build_and_bootstrap()
            .await;
        assert_eq!(second.pool_stats().await, expected);
        assert_eq!(
            second.validate_code(&served.code).await.unwrap().uses,
            served.uses
        );

        tokio::fs::remove_file(&path).await.ok();
    }
}

#[cfg(feature = "metrics")]
mod metrics {
    use super::*;
    use code_pool::metrics::InMemoryMetricsCollector;

    #[tokio::test]
    async fn collector_sees_lifecycle_events() {
        let collector = Arc::new(InMemoryMetricsCollector::new());
        let clock = Arc::new(ManualClock::new(T0));
        let manager = CodePoolManager::builder()
            .with_clock(Arc::clone(&clock))
            .with_code_generator(sequential_generator())
            .with_metrics_collector(collector.clone())
            .build_and_bootstrap()
            .await;

        manager.next_code().await;
        manager.validate_code("00000").await.ok();
        clock.advance_ms(24 * 3_600_000);
        manager.rotate().await;

        let metrics = collector.metrics();
        assert_eq!(metrics.codes_served, 1);
        assert_eq!(metrics.validation_failures, 1);
        assert_eq!(metrics.rotations, 1);
        assert!(metrics.records_pruned > 0);
        assert!(metrics.codes_generated > 0);
    }
}
