use std::sync::Arc;

use rand::Rng;

use super::clock::{Clock, SystemClock};
use super::config::PoolConfig;
use super::manager::{CodeGeneratorFn, CodePoolManager};
use super::storage::CodeStore;

#[cfg(feature = "metrics")]
use super::metrics::{MetricsCollector, NoOpMetricsCollector};
#[cfg(feature = "memory-storage")]
use super::storage::MemoryStore;

/// A builder for creating a [`CodePoolManager`] instance.
///
/// Defaults: `MemoryStore` backend, system clock, uniform-random code
/// generator, production configuration.
#[must_use = "The builder does nothing unless `.build_and_bootstrap()` is called."]
pub struct CodePoolManagerBuilder<S: CodeStore> {
    store: Arc<S>,
    config: Option<PoolConfig>,
    clock: Option<Arc<dyn Clock>>,
    generator: Option<CodeGeneratorFn>,
    #[cfg(feature = "metrics")]
    metrics: Option<Arc<dyn MetricsCollector>>,
}

#[cfg(feature = "memory-storage")]
impl CodePoolManagerBuilder<MemoryStore> {
    /// Creates a new builder backed by [`MemoryStore`]. Use
    /// `.with_store()` to provide a different backend.
    pub(crate) fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config: None,
            clock: None,
            generator: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }
}

impl<S: CodeStore + 'static> CodePoolManagerBuilder<S> {
    /// Specifies a custom storage backend instead of the default.
    pub fn with_store<T: CodeStore + 'static>(self, store: Arc<T>) -> CodePoolManagerBuilder<T> {
        CodePoolManagerBuilder {
            store,
            config: self.config,
            clock: self.clock,
            generator: self.generator,
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        }
    }

    /// Sets the pool configuration. Defaults to [`PoolConfig::default`].
    pub fn with_config(mut self, config: PoolConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the time source. Defaults to the system clock; tests inject a
    /// `ManualClock` here.
    pub fn with_clock(mut self, clock: Arc<impl Clock + 'static>) -> Self {
        let clock: Arc<dyn Clock> = clock;
        self.clock = Some(clock);
        self
    }

    /// Sets the raw code generator.
    ///
    /// The closure must return values in `[10000, 99999]`; the manager
    /// turns them into 5-digit strings verbatim. The default draws
    /// uniformly from that range.
    pub fn with_code_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Sets a metrics collector. Defaults to a no-op collector.
    #[cfg(feature = "metrics")]
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(collector);
        self
    }

    /// Builds the manager and bootstraps its pool.
    ///
    /// Bootstrapping fails soft: backend initialization or load errors are
    /// logged and the manager comes up on a seeded in-memory pool, so this
    /// method always yields a usable manager.
    pub async fn build_and_bootstrap(self) -> CodePoolManager<S> {
        if let Err(e) = self.store.init().await {
            tracing::warn!("storage backend init failed, continuing uninitialized: {e}");
        }

        let generator: CodeGeneratorFn = self
            .generator
            .unwrap_or_else(|| Box::new(|| rand::thread_rng().gen_range(10_000..=99_999)));

        let config = self.config.unwrap_or_default();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        #[cfg(feature = "metrics")]
        let manager = CodePoolManager::new(
            self.store,
            config,
            clock,
            generator,
            self.metrics
                .unwrap_or_else(|| Arc::new(NoOpMetricsCollector::new())),
        );
        #[cfg(not(feature = "metrics"))]
        let manager = CodePoolManager::new(self.store, config, clock, generator);

        manager.bootstrap().await;
        manager
    }
}
