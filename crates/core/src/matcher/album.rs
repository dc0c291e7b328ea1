//! Album matcher.

use async_trait::async_trait;

use super::config::{MatchingConfig, EXACT_YEAR_TOLERANCE};
use super::scoring::{artist_matches, rank};
use super::types::SourceAlbum;
use super::waterfall::{MatchError, MatchPolicy, TierOutcome};
use crate::catalog::{CatalogGateway, TargetCandidate};
use crate::similarity::{best_similarity, normalize, similarity, year_closeness};

const TITLE_WEIGHT: f64 = 0.6;
const ARTIST_WEIGHT: f64 = 0.3;
const YEAR_WEIGHT: f64 = 0.1;

/// Matches albums by exact title/artist/year, then fuzzy score.
pub struct AlbumMatcher {
    catalog: CatalogGateway,
    config: MatchingConfig,
}

impl AlbumMatcher {
    pub fn new(catalog: CatalogGateway, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }

    fn query(album: &SourceAlbum) -> String {
        match album.primary_artist() {
            Some(artist) => format!("{} {}", album.name, artist),
            None => album.name.clone(),
        }
    }

    fn is_exact(album: &SourceAlbum, candidate: &TargetCandidate) -> bool {
        let year_ok = match (album.release_year(), candidate.release_year()) {
            (Some(a), Some(b)) => (a - b).abs() <= EXACT_YEAR_TOLERANCE,
            _ => false,
        };

        year_ok
            && normalize(&album.name) == normalize(&candidate.name)
            && album
                .primary_artist()
                .is_some_and(|artist| artist_matches(artist, candidate))
    }

    /// Weighted fuzzy score in `[0, 1]`.
    pub fn score(album: &SourceAlbum, candidate: &TargetCandidate) -> f64 {
        let title = similarity(&album.name, &candidate.name);
        let artist = best_similarity(album.primary_artist().unwrap_or_default(), &candidate.artists);
        let year = year_closeness(album.release_year(), candidate.release_year());

        (TITLE_WEIGHT * title + ARTIST_WEIGHT * artist + YEAR_WEIGHT * year).min(1.0)
    }
}

#[async_trait]
impl MatchPolicy for AlbumMatcher {
    type Source = SourceAlbum;

    async fn exact_tier(&self, album: &SourceAlbum) -> Result<TierOutcome, MatchError> {
        let candidates = self
            .catalog
            .search_albums(&Self::query(album), self.config.exact_search_limit)
            .await?;

        Ok(candidates
            .into_iter()
            .find(|c| Self::is_exact(album, c))
            .map(TierOutcome::exact)
            .unwrap_or_else(TierOutcome::miss))
    }

    async fn fuzzy_tier(&self, album: &SourceAlbum) -> Result<TierOutcome, MatchError> {
        let candidates = self
            .catalog
            .search_albums(&Self::query(album), self.config.fuzzy_search_limit)
            .await?;

        Ok(rank(candidates, |c| Self::score(album, c))
            .into_iter()
            .next()
            .filter(|best| best.score >= self.config.low_confidence_floor && best.score > 0.0)
            .map(|best| TierOutcome::Accepted {
                target: best.candidate,
                confidence: best.score,
            })
            .unwrap_or_else(TierOutcome::miss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::rate_limiter::{RateLimitConfig, RateLimiter};
    use crate::testing::{fixtures, MockCatalogClient};

    fn matcher(catalog: Arc<MockCatalogClient>) -> AlbumMatcher {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            requests_per_second: 1000.0,
            burst_size: 8,
            queue_capacity: 32,
        }).unwrap());
        AlbumMatcher::new(
            CatalogGateway::new(catalog, limiter),
            MatchingConfig::default(),
        )
    }

    #[test]
    fn test_exact_year_tolerance() {
        let album = fixtures::source_album("s1", "Abbey Road", "The Beatles", 1969);

        assert!(AlbumMatcher::is_exact(
            &album,
            &fixtures::candidate_album("t1", "Abbey Road", "The Beatles", 1970)
        ));
        assert!(!AlbumMatcher::is_exact(
            &album,
            &fixtures::candidate_album("t2", "Abbey Road", "The Beatles", 2019)
        ));

        let mut undated = fixtures::candidate_album("t3", "Abbey Road", "The Beatles", 1969);
        undated.release_date = None;
        assert!(!AlbumMatcher::is_exact(&album, &undated));
    }

    #[test]
    fn test_score_uses_best_candidate_artist() {
        let album = fixtures::source_album("s1", "Tommy", "The Who", 1969);
        let mut candidate = TargetCandidate::new(
            "t1",
            "Tommy",
            vec!["London Symphony Orchestra".to_string(), "The Who".to_string()],
        );
        candidate.release_date = Some("1969".to_string());

        let score = AlbumMatcher::score(&album, &candidate);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_reissue_outside_year_tolerance_matches_fuzzily() {
        let catalog = Arc::new(MockCatalogClient::new());
        catalog
            .add_album(fixtures::candidate_album("t1", "Abbey Road", "The Beatles", 1987))
            .await;
        let matcher = matcher(Arc::clone(&catalog));

        let album = fixtures::source_album("s1", "Abbey Road", "The Beatles", 1969);
        assert_eq!(matcher.exact_tier(&album).await.unwrap(), TierOutcome::miss());

        match matcher.fuzzy_tier(&album).await.unwrap() {
            TierOutcome::Accepted { target, confidence } => {
                assert_eq!(target.id, "t1");
                assert!(confidence >= 0.7 && confidence < 0.99);
            }
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fuzzy_miss_has_no_suggestions() {
        let catalog = Arc::new(MockCatalogClient::new());
        catalog
            .add_album(fixtures::candidate_album("t1", "Greatest Hits", "The Beatles", 1990))
            .await;
        let matcher = matcher(Arc::clone(&catalog));

        let album = fixtures::source_album("s1", "Revolver", "The Beatles", 1966);
        assert_eq!(matcher.fuzzy_tier(&album).await.unwrap(), TierOutcome::miss());
    }
}
