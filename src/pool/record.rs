use serde::{Deserialize, Serialize};

/// Lifecycle status of a pooled access code.
///
/// A record moves `Active -> Retiring` once its expiry comes within the
/// configured retire horizon; it never moves back. `Emergency` records are
/// synthesized on demand when a consumer asks for a code and the pool has
/// no active record to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    /// Freshly generated and valid for hand-out.
    Active,
    /// Near expiry; still valid for use but excluded from new hand-outs
    /// via `active_codes()`.
    Retiring,
    /// Synthesized at query time because the pool was dry.
    Emergency,
}

/// A single access code held by the pool.
///
/// The code string is 5 decimal digits drawn from `[10000, 99999]`. It is
/// unique among non-expired records at creation time only; an old expired
/// value may legitimately reappear later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    /// The 5-digit code string.
    pub code: String,
    /// Milliseconds since epoch when the record was created.
    pub generated_at: i64,
    /// Milliseconds since epoch after which the code is no longer valid.
    /// Always strictly greater than `generated_at`.
    pub expires_at: i64,
    /// Current lifecycle status.
    pub status: CodeStatus,
    /// How many times the code has been handed out or consumed.
    /// Incremented only by consumption operations, never decremented.
    pub uses: u32,
    /// Most recent consumption time, if any.
    #[serde(default)]
    pub last_used_at: Option<i64>,
}

impl CodeRecord {
    /// Creates a new record with the given status and zero uses.
    pub(crate) fn new(code: String, generated_at: i64, expires_at: i64, status: CodeStatus) -> Self {
        debug_assert!(expires_at > generated_at);
        Self {
            code,
            generated_at,
            expires_at,
            status,
            uses: 0,
            last_used_at: None,
        }
    }

    /// Whether the record is past its expiry at `now_ms`.
    ///
    /// Expiry is exclusive of the current instant: `expires_at == now_ms`
    /// counts as expired.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }

    /// Whether the record is an unexpired `Active` record at `now_ms`.
    pub fn is_active_at(&self, now_ms: i64) -> bool {
        self.status == CodeStatus::Active && !self.is_expired(now_ms)
    }

    /// Whether the record's expiry falls within `horizon_ms` of `now_ms`.
    /// Rotation uses this to flip `Active` records to `Retiring`.
    pub fn within_retire_horizon(&self, now_ms: i64, horizon_ms: i64) -> bool {
        self.expires_at - now_ms <= horizon_ms
    }

    /// Whether pruning should drop this record at `now_ms`.
    ///
    /// An expired record survives pruning for `grace_ms` past `expires_at`
    /// when it was consumed within the last `grace_ms`, so a just-used code
    /// is not erased out from under its statistics.
    pub fn prunable_at(&self, now_ms: i64, grace_ms: i64) -> bool {
        if !self.is_expired(now_ms) {
            return false;
        }
        let recently_used = self
            .last_used_at
            .is_some_and(|used| now_ms - used <= grace_ms);
        if recently_used && now_ms < self.expires_at + grace_ms {
            return false;
        }
        true
    }
}
