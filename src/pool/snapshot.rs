//! Versioned snapshot export/import.
//!
//! Snapshots exist for backup/restore and for moving a pool between
//! deployments. The payload is a JSON document with an explicit version tag
//! so a future layout change can be detected instead of misparsed.

use serde::{Deserialize, Serialize};

use crate::pool::error::PoolError;
use crate::pool::record::CodeRecord;

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full serialized view of the pool's record list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Layout version tag; must equal [`SNAPSHOT_VERSION`] on import.
    pub version: u32,
    /// Milliseconds since epoch when the snapshot was taken.
    pub exported_at_ms: i64,
    /// The full record list.
    pub records: Vec<CodeRecord>,
}

impl PoolSnapshot {
    pub(crate) fn new(records: Vec<CodeRecord>, exported_at_ms: i64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at_ms,
            records,
        }
    }

    /// Serializes the snapshot to its JSON wire form.
    pub fn to_json(&self) -> String {
        // PoolSnapshot has no non-serializable fields; this cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses and validates a snapshot payload.
    ///
    /// Fails with `InvalidFormat` when the payload is not JSON, carries an
    /// unknown version tag, or contains a record violating the basic shape
    /// invariants (5-digit code, `expires_at > generated_at`).
    pub fn parse(json: &str) -> Result<Self, PoolError> {
        let snapshot: PoolSnapshot = serde_json::from_str(json)
            .map_err(|e| PoolError::InvalidFormat(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PoolError::InvalidFormat(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        for record in &snapshot.records {
            validate_record(record)?;
        }
        Ok(snapshot)
    }
}

fn validate_record(record: &CodeRecord) -> Result<(), PoolError> {
    if record.code.len() != 5 || !record.code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PoolError::InvalidFormat(format!(
            "code {:?} is not a 5-digit string",
            record.code
        )));
    }
    if record.expires_at <= record.generated_at {
        return Err(PoolError::InvalidFormat(format!(
            "code {} expires at or before its creation",
            record.code
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::record::CodeStatus;

    fn sample_records() -> Vec<CodeRecord> {
        vec![
            CodeRecord::new("10000".to_string(), 0, 1_000, CodeStatus::Active),
            CodeRecord::new("99999".to_string(), 500, 2_000, CodeStatus::Emergency),
        ]
    }

    #[test]
    fn test_round_trip() {
        let snapshot = PoolSnapshot::new(sample_records(), 5_000);
        let parsed = PoolSnapshot::parse(&snapshot.to_json()).unwrap();

        assert_eq!(parsed.version, SNAPSHOT_VERSION);
        assert_eq!(parsed.exported_at_ms, 5_000);
        assert_eq!(parsed.records, sample_records());
    }

    #[test]
    fn test_not_json() {
        let result = PoolSnapshot::parse("not json at all");
        assert!(matches!(result, Err(PoolError::InvalidFormat(_))));
    }

    #[test]
    fn test_wrong_version() {
        let mut snapshot = PoolSnapshot::new(sample_records(), 0);
        snapshot.version = 99;
        let result = PoolSnapshot::parse(&snapshot.to_json());
        assert!(matches!(result, Err(PoolError::InvalidFormat(msg)) if msg.contains("99")));
    }

    #[test]
    fn test_malformed_code_string() {
        let mut records = sample_records();
        records[0].code = "abcde".to_string();
        let snapshot = PoolSnapshot::new(records, 0);
        let result = PoolSnapshot::parse(&snapshot.to_json());
        assert!(matches!(result, Err(PoolError::InvalidFormat(_))));
    }

    #[test]
    fn test_inverted_timestamps() {
        let mut records = sample_records();
        records[1].expires_at = records[1].generated_at;
        let snapshot = PoolSnapshot::new(records, 0);
        let result = PoolSnapshot::parse(&snapshot.to_json());
        assert!(matches!(result, Err(PoolError::InvalidFormat(_))));
    }

    #[test]
    fn test_empty_record_list_is_valid() {
        let snapshot = PoolSnapshot::new(vec![], 0);
        let parsed = PoolSnapshot::parse(&snapshot.to_json()).unwrap();
        assert!(parsed.records.is_empty());
    }
}
