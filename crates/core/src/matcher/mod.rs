//! Waterfall matching of source catalog entities against the target catalog.
//!
//! Each entity kind has a matcher implementing [`MatchPolicy`]; the shared
//! [`run_waterfall`] drives it through cache lookup, unique-identifier
//! lookup, exact matching and fuzzy matching. [`MatchEngine`] bundles the
//! three matchers with a cache for callers.

mod album;
mod artist;
mod batch;
mod config;
mod engine;
mod scoring;
mod statistics;
mod track;
mod types;
mod waterfall;

pub use album::AlbumMatcher;
pub use artist::ArtistMatcher;
pub use batch::{match_all, BatchProgress};
pub use config::{MatchingConfig, EXACT_DURATION_TOLERANCE_SECS, EXACT_YEAR_TOLERANCE};
pub use engine::MatchEngine;
pub use scoring::{artist_matches, rank, ScoredCandidate};
pub use statistics::{statistics, ConfidenceBuckets, MatchStatistics, MethodCounts};
pub use track::TrackMatcher;
pub use types::*;
pub use waterfall::{run_waterfall, MatchError, MatchPolicy, TierOutcome, WaterfallState};
