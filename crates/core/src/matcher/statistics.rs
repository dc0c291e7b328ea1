//! Aggregate statistics over match results.

use serde::{Deserialize, Serialize};

use super::types::{MatchMethod, MatchResult};

/// Lower bound of the high-confidence band.
pub const HIGH_CONFIDENCE: f64 = 0.95;
/// Lower bound of the medium-confidence band.
pub const MEDIUM_CONFIDENCE: f64 = 0.85;
/// Lower bound of the low-confidence band.
pub const LOW_CONFIDENCE: f64 = 0.70;

/// Result counts per waterfall method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCounts {
    pub unique_id: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
}

/// Matched results per confidence band.
///
/// High is `>= 0.95`, medium `[0.85, 0.95)`, low `[0.70, 0.85)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBuckets {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub by_method: MethodCounts,
    pub confidence: ConfidenceBuckets,
}

impl MatchStatistics {
    /// Fraction of results that matched, 0.0 for an empty set.
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Aggregate a set of results. Pure; has no side effects.
pub fn statistics<S>(results: &[MatchResult<S>]) -> MatchStatistics {
    let mut stats = MatchStatistics {
        total: results.len(),
        ..Default::default()
    };

    for result in results {
        match result.method {
            MatchMethod::UniqueId => stats.by_method.unique_id += 1,
            MatchMethod::Exact => stats.by_method.exact += 1,
            MatchMethod::Fuzzy => stats.by_method.fuzzy += 1,
            MatchMethod::Unmatched => stats.by_method.unmatched += 1,
        }

        if result.target.is_none() {
            stats.unmatched += 1;
            continue;
        }
        stats.matched += 1;

        let c = result.confidence;
        if c >= HIGH_CONFIDENCE {
            stats.confidence.high += 1;
        } else if c >= MEDIUM_CONFIDENCE {
            stats.confidence.medium += 1;
        } else if c >= LOW_CONFIDENCE {
            stats.confidence.low += 1;
        }
    }

    stats
}
