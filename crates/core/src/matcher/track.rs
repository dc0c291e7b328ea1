//! Track matcher.

use async_trait::async_trait;

use super::config::{MatchingConfig, EXACT_DURATION_TOLERANCE_SECS};
use super::scoring::{artist_matches, rank};
use super::types::{SourceTrack, UNIQUE_ID_CONFIDENCE};
use super::waterfall::{MatchError, MatchPolicy, TierOutcome};
use crate::catalog::{CatalogGateway, TargetCandidate};
use crate::similarity::{
    clean_title, duration_close, duration_similarity, normalize, optional_similarity, similarity,
};

const TITLE_WEIGHT: f64 = 0.5;
const ARTIST_WEIGHT: f64 = 0.3;
const DURATION_WEIGHT: f64 = 0.1;
const ALBUM_WEIGHT: f64 = 0.1;

/// Matches tracks by ISRC, then exact title/artist/duration, then fuzzy score.
///
/// Unmatched tracks carry the best fuzzy candidates as suggestions.
pub struct TrackMatcher {
    catalog: CatalogGateway,
    config: MatchingConfig,
}

impl TrackMatcher {
    pub fn new(catalog: CatalogGateway, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }

    fn query(track: &SourceTrack, title: &str) -> String {
        match track.primary_artist() {
            Some(artist) => format!("{} {}", title, artist),
            None => title.to_string(),
        }
    }

    /// Same cleaned title, same artist, both durations known and within 2s.
    fn is_exact(track: &SourceTrack, candidate: &TargetCandidate) -> bool {
        let title_matches = normalize(&clean_title(&track.name))
            == normalize(&clean_title(&candidate.name));

        let artist_ok = track
            .primary_artist()
            .is_some_and(|artist| artist_matches(artist, candidate));

        let duration_ok = match (track.duration_ms, candidate.duration_ms) {
            (Some(a), Some(b)) => duration_close(a, b, EXACT_DURATION_TOLERANCE_SECS),
            _ => false,
        };

        title_matches && artist_ok && duration_ok
    }

    /// Weighted fuzzy score in `[0, 1]`.
    pub fn score(track: &SourceTrack, candidate: &TargetCandidate) -> f64 {
        let title = similarity(&clean_title(&track.name), &clean_title(&candidate.name));
        let artist = similarity(
            track.primary_artist().unwrap_or_default(),
            candidate.primary_artist().unwrap_or_default(),
        );
        let duration = duration_similarity(track.duration_ms, candidate.duration_ms);
        let album = optional_similarity(track.album.as_deref(), candidate.album.as_deref());

        (TITLE_WEIGHT * title
            + ARTIST_WEIGHT * artist
            + DURATION_WEIGHT * duration
            + ALBUM_WEIGHT * album)
            .min(1.0)
    }
}

#[async_trait]
impl MatchPolicy for TrackMatcher {
    type Source = SourceTrack;

    async fn unique_id_tier(
        &self,
        _track: &SourceTrack,
        code: &str,
    ) -> Result<TierOutcome, MatchError> {
        Ok(match self.catalog.lookup_by_unique_id(code).await? {
            Some(target) => TierOutcome::Accepted {
                target,
                confidence: UNIQUE_ID_CONFIDENCE,
            },
            None => TierOutcome::miss(),
        })
    }

    async fn exact_tier(&self, track: &SourceTrack) -> Result<TierOutcome, MatchError> {
        let query = Self::query(track, &track.name);
        let candidates = self
            .catalog
            .search_tracks(&query, self.config.exact_search_limit)
            .await?;

        Ok(candidates
            .into_iter()
            .find(|c| Self::is_exact(track, c))
            .map(TierOutcome::exact)
            .unwrap_or_else(TierOutcome::miss))
    }

    async fn fuzzy_tier(&self, track: &SourceTrack) -> Result<TierOutcome, MatchError> {
        let query = Self::query(track, &clean_title(&track.name));
        let candidates = self
            .catalog
            .search_tracks(&query, self.config.fuzzy_search_limit)
            .await?;

        let mut ranked = rank(candidates, |c| Self::score(track, c));

        match ranked.first() {
            Some(best) if best.score >= self.config.low_confidence_floor && best.score > 0.0 => {
                let best = ranked.swap_remove(0);
                Ok(TierOutcome::Accepted {
                    target: best.candidate,
                    confidence: best.score,
                })
            }
            _ => {
                ranked.truncate(self.config.suggestion_limit);
                Ok(TierOutcome::Miss {
                    suggestions: ranked.into_iter().map(|s| s.candidate).collect(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::rate_limiter::{RateLimitConfig, RateLimiter};
    use crate::testing::{fixtures, MockCatalogClient, RecordedCatalogQuery};

    fn matcher(catalog: Arc<MockCatalogClient>) -> TrackMatcher {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            requests_per_second: 1000.0,
            burst_size: 8,
            queue_capacity: 32,
        }).unwrap());
        TrackMatcher::new(
            CatalogGateway::new(catalog, limiter),
            MatchingConfig::default(),
        )
    }

    #[test]
    fn test_exact_requires_known_durations() {
        let track = fixtures::source_track("s1", "Let It Be (2021 Remaster)", "The Beatles", 242_000);
        let mut candidate = fixtures::candidate_track("t1", "Let It Be", "The Beatles", 243_000);
        assert!(TrackMatcher::is_exact(&track, &candidate));

        candidate.duration_ms = Some(245_000);
        assert!(!TrackMatcher::is_exact(&track, &candidate));

        candidate.duration_ms = None;
        assert!(!TrackMatcher::is_exact(&track, &candidate));
    }

    #[test]
    fn test_exact_checks_full_artist_list() {
        let track = fixtures::source_track("s1", "Under Pressure", "David Bowie", 248_000);
        let mut candidate = fixtures::candidate_track("t1", "Under Pressure", "Queen", 248_000);
        assert!(!TrackMatcher::is_exact(&track, &candidate));

        candidate.artists.push("David Bowie".to_string());
        assert!(TrackMatcher::is_exact(&track, &candidate));
    }

    #[test]
    fn test_score_weights() {
        let track = fixtures::source_track("s1", "Creep", "Radiohead", 238_000);
        let same = fixtures::candidate_track("t1", "Creep", "Radiohead", 238_000);
        // Title, artist and duration perfect; album unknown on both sides
        let expected = TITLE_WEIGHT + ARTIST_WEIGHT + DURATION_WEIGHT + ALBUM_WEIGHT * 0.5;
        assert!((TrackMatcher::score(&track, &same) - expected).abs() < 1e-9);

        let far = fixtures::candidate_track("t2", "Creep", "Radiohead", 300_000);
        let expected_far = TITLE_WEIGHT + ARTIST_WEIGHT + ALBUM_WEIGHT * 0.5;
        assert!((TrackMatcher::score(&track, &far) - expected_far).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_exact_tier_takes_first_qualifying_candidate() {
        let catalog = Arc::new(MockCatalogClient::new());
        catalog
            .add_track(fixtures::candidate_track("live", "Let It Be (Live)", "The Beatles", 260_000))
            .await;
        catalog
            .add_track(fixtures::candidate_track("first", "Let It Be", "The Beatles", 243_000))
            .await;
        catalog
            .add_track(fixtures::candidate_track("second", "Let It Be", "The Beatles", 242_500))
            .await;
        let matcher = matcher(Arc::clone(&catalog));

        let track = fixtures::source_track("s1", "Let It Be", "The Beatles", 242_000);
        let outcome = matcher.exact_tier(&track).await.unwrap();
        match outcome {
            TierOutcome::Accepted { target, confidence } => {
                assert_eq!(target.id, "first");
                assert_eq!(confidence, 0.99);
            }
            other => panic!("expected exact match, got {:?}", other),
        }

        assert_eq!(
            catalog.recorded_queries().await,
            vec![RecordedCatalogQuery::SearchTracks {
                query: "Let It Be The Beatles".to_string(),
                limit: 10,
            }]
        );
    }

    #[tokio::test]
    async fn test_fuzzy_tier_accepts_above_floor() {
        let catalog = Arc::new(MockCatalogClient::new());
        catalog
            .add_track(fixtures::candidate_track("t1", "Bohemian Rhapsody", "Queen", 354_000))
            .await;
        let matcher = matcher(Arc::clone(&catalog));

        let track = fixtures::source_track("s1", "Bohemian Rhapsody", "Queen", 360_000);
        let outcome = matcher.fuzzy_tier(&track).await.unwrap();
        assert!(matches!(
            outcome,
            TierOutcome::Accepted { ref target, confidence } if target.id == "t1" && confidence >= 0.7
        ));
    }

    #[tokio::test]
    async fn test_fuzzy_tier_miss_returns_top_suggestions() {
        let catalog = Arc::new(MockCatalogClient::new());
        for (id, name) in [("a", "Song One"), ("b", "Song Two"), ("c", "Song Three"), ("d", "Song Four")] {
            catalog
                .add_track(fixtures::candidate_track(id, name, "Other Band", 100_000))
                .await;
        }
        let matcher = matcher(Arc::clone(&catalog));

        // All four share the artist, none is close enough on title and duration
        let track = fixtures::source_track("s1", "Song", "Other Band", 400_000);
        let outcome = matcher.fuzzy_tier(&track).await.unwrap();
        match outcome {
            TierOutcome::Miss { suggestions } => assert_eq!(suggestions.len(), 3),
            other => panic!("expected miss, got {:?}", other),
        }
    }
}
