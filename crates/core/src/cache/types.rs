//! Types for the match cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::TargetCandidate;
use crate::matcher::{EntityKind, MatchMethod};

/// A previously computed match outcome.
///
/// Keyed by `(kind, source_id)`, and additionally findable by `unique_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub kind: EntityKind,
    pub source_id: String,
    /// Unique identifier code of the source entity (ISRC), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Matched target, absent for unmatched outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetCandidate>,
    pub method: MatchMethod,
    pub confidence: f64,
    /// Reviewer suggestions kept so that a cache hit replays the full result.
    #[serde(default)]
    pub suggestions: Vec<TargetCandidate>,
    pub cached_at: DateTime<Utc>,
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStats {
    /// Total cached outcomes.
    pub entries: u64,
    /// Cached outcomes that carry a target.
    pub matched_entries: u64,
    /// Oldest entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Most recent entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

/// Errors for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Canonical form of a unique identifier code for storage and lookup.
pub(crate) fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" gbum71029604 "), "GBUM71029604");
    }

    #[test]
    fn test_cache_stats_serialization_skips_empty_timestamps() {
        let stats = CacheStats {
            entries: 0,
            matched_entries: 0,
            oldest_entry: None,
            newest_entry: None,
        };
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"entries":0,"matched_entries":0}"#
        );
    }
}
