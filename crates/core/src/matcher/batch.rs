//! Batch matching with ordered results and progress reporting.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::{FutureExt, StreamExt};
use serde::Serialize;
use tracing::{error, info};

use super::types::{MatchResult, SourceEntity};
use super::waterfall::{run_waterfall, MatchPolicy};
use crate::cache::MatchCache;

/// Progress after one entity of a batch has completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    /// 1-based position of the completed entity.
    pub current: usize,
    pub total: usize,
    /// Label of the entity just processed.
    pub label: Option<String>,
}

/// Match every entity, returning results in input order.
///
/// Up to `concurrency` entities are in flight at once; their catalog calls
/// still share the one rate limiter behind `policy`. `on_progress` is called
/// once per entity, in input order, as each result is delivered.
pub async fn match_all<P, F>(
    policy: &P,
    cache: &dyn MatchCache,
    entities: Vec<P::Source>,
    concurrency: usize,
    mut on_progress: F,
) -> Vec<MatchResult<P::Source>>
where
    P: MatchPolicy,
    F: FnMut(BatchProgress) + Send,
{
    let total = entities.len();
    let kind = <P::Source as SourceEntity>::KIND;
    info!(kind = %kind, total, concurrency, "Starting batch match");

    let mut results = Vec::with_capacity(total);
    let mut stream = futures::stream::iter(entities)
        .map(|entity| {
            let fallback = entity.clone();
            guarded(fallback, run_waterfall(policy, cache, entity))
        })
        .buffered(concurrency.max(1));

    while let Some(result) = stream.next().await {
        on_progress(BatchProgress {
            current: results.len() + 1,
            total,
            label: Some(result.source.label()),
        });
        results.push(result);
    }

    let matched = results.iter().filter(|r| r.is_matched()).count();
    info!(kind = %kind, total, matched, "Batch match complete");
    results
}

/// Run a match, degrading a panic to an Unmatched result.
pub(crate) async fn guarded<S, Fut>(source: S, matching: Fut) -> MatchResult<S>
where
    S: SourceEntity,
    Fut: Future<Output = MatchResult<S>>,
{
    match AssertUnwindSafe(matching).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(
                kind = %S::KIND,
                source_id = %source.id(),
                "Matching failed unexpectedly: {}",
                message
            );
            MatchResult {
                note: Some(format!("matching failed: {}", message)),
                ..MatchResult::unmatched(source, Vec::new())
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use crate::cache::MemoryMatchCache;
    use crate::matcher::waterfall::{MatchError, TierOutcome};
    use crate::matcher::{MatchMethod, SourceArtist};
    use crate::testing::fixtures;

    /// Accepts every artist exactly, sleeping longer for earlier entities
    /// so that completion order differs from input order. Panics on "boom".
    struct SlowPolicy;

    #[async_trait]
    impl MatchPolicy for SlowPolicy {
        type Source = SourceArtist;

        async fn exact_tier(&self, artist: &SourceArtist) -> Result<TierOutcome, MatchError> {
            if artist.name == "boom" {
                panic!("exploded on {}", artist.id);
            }
            let delay: u64 = artist.id.trim_start_matches('a').parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - delay * 10)).await;
            Ok(TierOutcome::exact(fixtures::candidate_artist(
                &format!("t-{}", artist.id),
                &artist.name,
            )))
        }

        async fn fuzzy_tier(&self, _artist: &SourceArtist) -> Result<TierOutcome, MatchError> {
            Ok(TierOutcome::miss())
        }
    }

    fn artists(names: &[&str]) -> Vec<SourceArtist> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| fixtures::source_artist(&format!("a{}", i), name))
            .collect()
    }

    #[tokio::test]
    async fn test_results_and_progress_follow_input_order() {
        let cache = MemoryMatchCache::new();
        let mut progress = Vec::new();

        let results = match_all(
            &SlowPolicy,
            &cache,
            artists(&["One", "Two", "Three", "Four"]),
            4,
            |p| progress.push(p),
        )
        .await;

        let ids: Vec<_> = results.iter().map(|r| r.source.id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1", "a2", "a3"]);

        assert_eq!(progress.len(), 4);
        assert_eq!(progress[0].current, 1);
        assert_eq!(progress[3].current, 4);
        assert!(progress.iter().all(|p| p.total == 4));
        assert_eq!(progress[1].label.as_deref(), Some("Two"));
    }

    #[tokio::test]
    async fn test_panic_degrades_single_entity() {
        let cache = MemoryMatchCache::new();

        let results = match_all(&SlowPolicy, &cache, artists(&["One", "boom", "Three"]), 1, |_| {}).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].method, MatchMethod::Exact);
        assert!(!results[1].is_matched());
        assert_eq!(results[1].confidence, 0.0);
        assert!(results[1].note.as_deref().unwrap().contains("exploded on a1"));
        assert_eq!(results[2].method, MatchMethod::Exact);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let cache = MemoryMatchCache::new();
        let mut calls = 0;
        let results = match_all(&SlowPolicy, &cache, Vec::new(), 2, |_| calls += 1).await;
        assert!(results.is_empty());
        assert_eq!(calls, 0);
    }
}
