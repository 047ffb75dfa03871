//! Wall-clock port.
//!
//! Every timestamp in the pool is milliseconds since the Unix epoch. The
//! manager never reads the system clock directly; it goes through a [`Clock`]
//! so tests and debug tooling can drive time deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time source for the pool, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The real system clock.
///
/// In the extremely rare case where system time is before the Unix epoch,
/// this returns 0 instead of panicking.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A manually-advanced clock for tests and forced-rotation debugging.
///
/// # Example
///
/// ```rust
/// use code_pool::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000_000);
/// assert_eq!(clock.now_ms(), 1_000_000);
/// clock.advance_ms(3_601_000);
/// assert_eq!(clock.now_ms(), 4_601_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a manual clock pinned at the given epoch-milliseconds value.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Creates a manual clock starting at the current system time, wrapped
    /// in an `Arc` ready to hand to a builder.
    pub fn starting_now() -> Arc<Self> {
        Arc::new(Self::new(SystemClock.now_ms()))
    }

    /// Moves the clock forward by `delta_ms` milliseconds.
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Pins the clock to an absolute epoch-milliseconds value.
    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
