use std::time::Duration;

/// Predefined configuration presets for common deployment scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Production-ready configuration.
    ///
    /// - Rotation every hour, maintenance every 10 minutes, pruning every 5
    /// - Pool bounded to 20 records, replenished to 5 active
    Production,

    /// Development-friendly configuration.
    ///
    /// Compressed schedules so lifecycle transitions are observable within
    /// a working session:
    /// - Rotation every 5 minutes, maintenance every minute, pruning every 30s
    /// - Codes live 10 minutes, retiring within the last 2
    Development,

    /// Load configuration from environment variables.
    ///
    /// Reads (all optional, falling back to production defaults):
    /// - `CODE_POOL_ROTATION_INTERVAL_SECS`
    /// - `CODE_POOL_CODE_TTL_SECS`
    /// - `CODE_POOL_MAX_CODES`
    /// - `CODE_POOL_MIN_ACTIVE_CODES`
    FromEnv,
}

/// Configuration for the code pool manager.
///
/// All durations are wall-clock; the manager converts them to epoch
/// milliseconds against its injected clock.
///
/// # Example
///
/// ```rust
/// use code_pool::pool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig {
///     max_codes: 50,
///     code_ttl: Duration::from_secs(7200),
///     ..PoolConfig::default()
/// };
/// assert_eq!(config.max_codes, 50);
/// for warning in config.validate() {
///     eprintln!("config warning: {warning}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Period of the full rotation cycle (prune, replenish, retire).
    pub rotation_interval: Duration,
    /// Period of the lighter-weight maintenance check (replenish only).
    pub maintenance_interval: Duration,
    /// Period of the standalone expiry-pruning pass.
    pub prune_interval: Duration,
    /// Lifetime of a newly generated code, before per-index staggering.
    pub code_ttl: Duration,
    /// Lifetime of an emergency code synthesized when the pool is dry.
    pub emergency_ttl: Duration,
    /// An `Active` record whose expiry falls within this horizon is marked
    /// `Retiring` during rotation.
    pub retire_horizon: Duration,
    /// Grace window past expiry for recently-used records during pruning.
    pub prune_grace: Duration,
    /// Per-index expiry offset applied when generating a batch, so a batch
    /// does not expire all at once.
    pub stagger: Duration,
    /// Hard upper bound on pool size; overflow drops oldest-by-expiry.
    pub max_codes: usize,
    /// Replenishment target: maintenance generates codes until at least
    /// this many unexpired `Active` records exist.
    pub min_active_codes: usize,
    /// Uniqueness retry bound for code generation. When exhausted, the last
    /// candidate is accepted even if it collides; this is deliberate and
    /// bounded rather than a silent fallback.
    pub max_generation_attempts: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(
                env_secs("CODE_POOL_ROTATION_INTERVAL_SECS").unwrap_or(3600),
            ),
            maintenance_interval: Duration::from_secs(600),
            prune_interval: Duration::from_secs(300),
            code_ttl: Duration::from_secs(env_secs("CODE_POOL_CODE_TTL_SECS").unwrap_or(3600)),
            emergency_ttl: Duration::from_secs(600),
            retire_horizon: Duration::from_secs(1800),
            prune_grace: Duration::from_secs(300),
            stagger: Duration::from_secs(60),
            max_codes: env_usize("CODE_POOL_MAX_CODES").unwrap_or(20),
            min_active_codes: env_usize("CODE_POOL_MIN_ACTIVE_CODES").unwrap_or(5),
            max_generation_attempts: 100,
        }
    }
}

fn env_secs(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl PoolConfig {
    /// Validates the configuration and returns any warnings.
    ///
    /// Warnings flag settings that are legal but likely to misbehave; the
    /// manager runs with them regardless.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.min_active_codes > self.max_codes {
            warnings.push(
                "min_active_codes exceeds max_codes; trimming will fight replenishment"
                    .to_string(),
            );
        }
        if self.code_ttl <= self.retire_horizon {
            warnings.push(
                "code_ttl is within the retire horizon; codes will be born retiring".to_string(),
            );
        }
        if self.rotation_interval > self.code_ttl {
            warnings.push(
                "rotation interval exceeds code TTL; the pool may drain between rotations"
                    .to_string(),
            );
        }
        if self.max_generation_attempts == 0 {
            warnings.push(
                "max_generation_attempts is 0; every generated code skips the uniqueness check"
                    .to_string(),
            );
        }

        warnings
    }

    /// Returns a one-line summary of the current configuration.
    pub fn summary(&self) -> String {
        format!(
            "PoolConfig {{ rotation: {}s, ttl: {}s, max: {}, min_active: {} }}",
            self.rotation_interval.as_secs(),
            self.code_ttl.as_secs(),
            self.max_codes,
            self.min_active_codes,
        )
    }
}

impl From<ConfigPreset> for PoolConfig {
    fn from(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Production => Self {
                rotation_interval: Duration::from_secs(3600),
                maintenance_interval: Duration::from_secs(600),
                prune_interval: Duration::from_secs(300),
                code_ttl: Duration::from_secs(3600),
                emergency_ttl: Duration::from_secs(600),
                retire_horizon: Duration::from_secs(1800),
                prune_grace: Duration::from_secs(300),
                stagger: Duration::from_secs(60),
                max_codes: 20,
                min_active_codes: 5,
                max_generation_attempts: 100,
            },
            ConfigPreset::Development => Self {
                rotation_interval: Duration::from_secs(300),
                maintenance_interval: Duration::from_secs(60),
                prune_interval: Duration::from_secs(30),
                code_ttl: Duration::from_secs(600),
                emergency_ttl: Duration::from_secs(120),
                retire_horizon: Duration::from_secs(120),
                prune_grace: Duration::from_secs(30),
                stagger: Duration::from_secs(10),
                max_codes: 20,
                min_active_codes: 5,
                max_generation_attempts: 100,
            },
            ConfigPreset::FromEnv => Self::default(),
        }
    }
}
