//! The waterfall state machine shared by every matcher.
//!
//! Tiers are tried strictly in order and the first accepted candidate ends
//! the walk:
//!
//! ```text
//! CacheLookup -> UniqueIdLookup -> ExactMatch -> FuzzyMatch -> Unmatched
//! ```
//!
//! `UniqueIdLookup` is skipped for entities without a unique identifier
//! code. A [`MatchPolicy`] supplies the tier logic for one entity kind; this
//! module owns ordering, cache access, and failure recovery.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{MatchMethod, MatchResult, SourceEntity, EXACT_MATCH_CONFIDENCE};
use crate::cache::{CacheEntry, MatchCache};
use crate::catalog::{CatalogError, TargetCandidate};
use crate::metrics;

/// Errors raised inside a tier. Always recovered as a tier miss.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Catalog call failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Position of a single entity in the waterfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterfallState {
    CacheLookup,
    UniqueIdLookup,
    ExactMatch,
    FuzzyMatch,
    Unmatched,
}

impl WaterfallState {
    /// The state to enter after a miss in this one.
    pub fn advance(self, has_unique_id: bool) -> Self {
        match self {
            WaterfallState::CacheLookup if has_unique_id => WaterfallState::UniqueIdLookup,
            WaterfallState::CacheLookup => WaterfallState::ExactMatch,
            WaterfallState::UniqueIdLookup => WaterfallState::ExactMatch,
            WaterfallState::ExactMatch => WaterfallState::FuzzyMatch,
            WaterfallState::FuzzyMatch | WaterfallState::Unmatched => WaterfallState::Unmatched,
        }
    }

    /// The method recorded when a candidate is accepted in this state.
    pub fn method(self) -> MatchMethod {
        match self {
            WaterfallState::UniqueIdLookup => MatchMethod::UniqueId,
            WaterfallState::ExactMatch => MatchMethod::Exact,
            WaterfallState::FuzzyMatch => MatchMethod::Fuzzy,
            WaterfallState::CacheLookup | WaterfallState::Unmatched => MatchMethod::Unmatched,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaterfallState::CacheLookup => "cache_lookup",
            WaterfallState::UniqueIdLookup => "unique_id_lookup",
            WaterfallState::ExactMatch => "exact_match",
            WaterfallState::FuzzyMatch => "fuzzy_match",
            WaterfallState::Unmatched => "unmatched",
        }
    }
}

/// Result of running one tier.
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome {
    /// The tier produced an acceptable candidate.
    Accepted {
        target: TargetCandidate,
        confidence: f64,
    },
    /// Nothing acceptable; `suggestions` are kept for an Unmatched result.
    Miss { suggestions: Vec<TargetCandidate> },
}

impl TierOutcome {
    pub fn miss() -> Self {
        TierOutcome::Miss {
            suggestions: Vec::new(),
        }
    }

    /// An exact-tier acceptance at the fixed exact confidence.
    pub fn exact(target: TargetCandidate) -> Self {
        TierOutcome::Accepted {
            target,
            confidence: EXACT_MATCH_CONFIDENCE,
        }
    }
}

/// Tier logic for one entity kind.
#[async_trait]
pub trait MatchPolicy: Send + Sync {
    type Source: SourceEntity;

    /// Resolve the entity by its unique identifier code.
    async fn unique_id_tier(
        &self,
        _source: &Self::Source,
        _code: &str,
    ) -> Result<TierOutcome, MatchError> {
        Ok(TierOutcome::miss())
    }

    /// Search and accept the first candidate that matches exactly.
    async fn exact_tier(&self, source: &Self::Source) -> Result<TierOutcome, MatchError>;

    /// Search more broadly and accept the best-scoring candidate.
    async fn fuzzy_tier(&self, source: &Self::Source) -> Result<TierOutcome, MatchError>;
}

/// Match a single entity through the waterfall.
///
/// Never fails: catalog errors become tier misses and cache errors become
/// cache misses or skipped writes. Invalid entities are rejected before any
/// tier runs and are not cached.
pub async fn run_waterfall<P: MatchPolicy>(
    policy: &P,
    cache: &dyn MatchCache,
    source: P::Source,
) -> MatchResult<P::Source> {
    let kind = <P::Source as SourceEntity>::KIND;

    if let Err(reason) = source.validate() {
        warn!(
            kind = %kind,
            source_id = %source.id(),
            "Rejecting invalid source entity: {}",
            reason
        );
        return finish(MatchResult::rejected(
            source,
            format!("invalid source entity: {}", reason),
        ));
    }

    let unique_id = source.unique_id().map(str::to_string);
    let mut state = WaterfallState::CacheLookup;
    let mut suggestions = Vec::new();

    loop {
        let outcome = match state {
            WaterfallState::CacheLookup => {
                if let Some(entry) = cached(cache, &source, unique_id.as_deref()) {
                    return finish(MatchResult::from_cache_entry(source, entry));
                }
                Ok(TierOutcome::miss())
            }
            WaterfallState::UniqueIdLookup => match unique_id.as_deref() {
                Some(code) => policy.unique_id_tier(&source, code).await,
                None => Ok(TierOutcome::miss()),
            },
            WaterfallState::ExactMatch => policy.exact_tier(&source).await,
            WaterfallState::FuzzyMatch => policy.fuzzy_tier(&source).await,
            WaterfallState::Unmatched => break,
        };

        match outcome {
            Ok(TierOutcome::Accepted { target, confidence }) => {
                debug!(
                    kind = %kind,
                    source_id = %source.id(),
                    tier = state.as_str(),
                    target_id = %target.id,
                    confidence,
                    "Match accepted"
                );
                let result = MatchResult::matched(source, target, state.method(), confidence);
                store(cache, &result);
                return finish(result);
            }
            Ok(TierOutcome::Miss {
                suggestions: tier_suggestions,
            }) => {
                if !tier_suggestions.is_empty() {
                    suggestions = tier_suggestions;
                }
            }
            Err(e) => {
                debug!(
                    kind = %kind,
                    source_id = %source.id(),
                    tier = state.as_str(),
                    "Tier failed, falling through: {}",
                    e
                );
            }
        }

        state = state.advance(unique_id.is_some());
    }

    debug!(kind = %kind, source_id = %source.id(), "No tier produced a match");
    let result = MatchResult::unmatched(source, suggestions);
    store(cache, &result);
    finish(result)
}

/// Cache lookup by id, then by unique identifier code.
fn cached<S: SourceEntity>(
    cache: &dyn MatchCache,
    source: &S,
    unique_id: Option<&str>,
) -> Option<CacheEntry> {
    match cache.get(S::KIND, source.id()) {
        Ok(Some(entry)) => {
            debug!(kind = %S::KIND, source_id = %source.id(), "Cache hit");
            metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            return Some(entry);
        }
        Ok(None) => {}
        Err(e) => {
            warn!(kind = %S::KIND, source_id = %source.id(), "Cache lookup failed: {}", e);
            metrics::CACHE_LOOKUPS.with_label_values(&["error"]).inc();
            return None;
        }
    }

    if let Some(code) = unique_id {
        match cache.get_by_unique_id(code) {
            Ok(Some(entry)) if entry.kind == S::KIND => {
                debug!(
                    kind = %S::KIND,
                    source_id = %source.id(),
                    unique_id = %code,
                    cached_source_id = %entry.source_id,
                    "Cache hit by unique id"
                );
                metrics::CACHE_LOOKUPS
                    .with_label_values(&["hit_unique_id"])
                    .inc();
                return Some(entry);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(unique_id = %code, "Cache lookup by unique id failed: {}", e);
                metrics::CACHE_LOOKUPS.with_label_values(&["error"]).inc();
                return None;
            }
        }
    }

    metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
    None
}

fn store<S: SourceEntity>(cache: &dyn MatchCache, result: &MatchResult<S>) {
    if let Err(e) = cache.put(&result.to_cache_entry(Utc::now())) {
        warn!(
            kind = %S::KIND,
            source_id = %result.source.id(),
            "Failed to cache match result: {}",
            e
        );
    }
}

fn finish<S: SourceEntity>(result: MatchResult<S>) -> MatchResult<S> {
    metrics::MATCH_RESULTS
        .with_label_values(&[S::KIND.as_str(), result.method.as_str()])
        .inc();
    if result.is_matched() {
        metrics::MATCH_CONFIDENCE
            .with_label_values(&[S::KIND.as_str()])
            .observe(result.confidence);
    }
    result
}
