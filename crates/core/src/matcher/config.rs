//! Matcher configuration.

use serde::{Deserialize, Serialize};

/// Maximum duration difference for an exact track match.
pub const EXACT_DURATION_TOLERANCE_SECS: u64 = 2;

/// Maximum release-year difference for an exact album match.
pub const EXACT_YEAR_TOLERANCE: i32 = 1;

/// Configuration for the waterfall matchers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Minimum fuzzy score for a candidate to be accepted.
    #[serde(default = "default_low_confidence_floor")]
    pub low_confidence_floor: f64,

    /// Result limit of the exact-tier search.
    #[serde(default = "default_exact_search_limit")]
    pub exact_search_limit: u32,

    /// Result limit of the fuzzy-tier search.
    #[serde(default = "default_fuzzy_search_limit")]
    pub fuzzy_search_limit: u32,

    /// Number of candidates attached to unmatched tracks.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Entities matched concurrently within a batch.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_low_confidence_floor() -> f64 {
    0.70
}

fn default_exact_search_limit() -> u32 {
    10
}

fn default_fuzzy_search_limit() -> u32 {
    20
}

fn default_suggestion_limit() -> usize {
    3
}

fn default_batch_concurrency() -> usize {
    1
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            low_confidence_floor: default_low_confidence_floor(),
            exact_search_limit: default_exact_search_limit(),
            fuzzy_search_limit: default_fuzzy_search_limit(),
            suggestion_limit: default_suggestion_limit(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MatchingConfig = toml::from_str("fuzzy_search_limit = 50").unwrap();
        assert_eq!(config.fuzzy_search_limit, 50);
        assert_eq!(config.exact_search_limit, 10);
        assert_eq!(config.low_confidence_floor, 0.70);
        assert_eq!(config.suggestion_limit, 3);
    }
}
