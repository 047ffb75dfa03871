//! Timer-driven pool maintenance.
//!
//! Three independent schedules run against one shared manager: the full
//! rotation cycle, the lighter replenishment check, and the standalone
//! expiry pruner. They need no coordination beyond the manager's own lock;
//! each tick runs one operation to completion.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::manager::CodePoolManager;
use super::storage::CodeStore;

/// Handle over the spawned maintenance tasks.
///
/// The tasks run until [`shutdown`](PoolScheduler::shutdown) is called or
/// the handle is dropped; there is no cancellation mid-operation, a tick
/// that has started runs to completion inside the manager's lock.
///
/// # Example
///
/// ```rust,no_run
/// use code_pool::{CodePoolManager, PoolScheduler};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let manager = Arc::new(CodePoolManager::builder().build_and_bootstrap().await);
/// let scheduler = PoolScheduler::spawn(Arc::clone(&manager));
/// // ... serve codes ...
/// scheduler.shutdown();
/// # }
/// ```
pub struct PoolScheduler {
    handles: Vec<JoinHandle<()>>,
}

impl PoolScheduler {
    /// Spawns the rotation, maintenance, and pruning loops over the given
    /// manager, with periods taken from its configuration.
    ///
    /// The first tick of each loop fires one full period after spawning;
    /// bootstrap already left the pool in shape, so there is nothing to do
    /// immediately.
    pub fn spawn<S: CodeStore + 'static>(manager: Arc<CodePoolManager<S>>) -> Self {
        let config = manager.config();
        let rotation = config.rotation_interval;
        let maintenance = config.maintenance_interval;
        let prune = config.prune_interval;

        let handles = vec![
            {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(rotation);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        let report = manager.rotate().await;
                        tracing::debug!(?report, "scheduled rotation");
                    }
                })
            },
            {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(maintenance);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        let generated = manager.maintain().await;
                        if generated > 0 {
                            tracing::debug!(generated, "scheduled maintenance replenished pool");
                        }
                    }
                })
            },
            {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(prune);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        manager.prune_expired().await;
                    }
                })
            },
        ];

        Self { handles }
    }

    /// Stops all maintenance tasks.
    pub fn shutdown(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for PoolScheduler {
    fn drop(&mut self) {
        self.abort_all();
    }
}
