//! Artist matcher. Scores on name alone.

use async_trait::async_trait;

use super::config::MatchingConfig;
use super::scoring::rank;
use super::types::SourceArtist;
use super::waterfall::{MatchError, MatchPolicy, TierOutcome};
use crate::catalog::CatalogGateway;
use crate::similarity::{normalize, similarity};

pub struct ArtistMatcher {
    catalog: CatalogGateway,
    config: MatchingConfig,
}

impl ArtistMatcher {
    pub fn new(catalog: CatalogGateway, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }
}

#[async_trait]
impl MatchPolicy for ArtistMatcher {
    type Source = SourceArtist;

    async fn exact_tier(&self, artist: &SourceArtist) -> Result<TierOutcome, MatchError> {
        let wanted = normalize(&artist.name);
        let candidates = self
            .catalog
            .search_artists(&artist.name, self.config.exact_search_limit)
            .await?;

        Ok(candidates
            .into_iter()
            .find(|c| normalize(&c.name) == wanted)
            .map(TierOutcome::exact)
            .unwrap_or_else(TierOutcome::miss))
    }

    async fn fuzzy_tier(&self, artist: &SourceArtist) -> Result<TierOutcome, MatchError> {
        let candidates = self
            .catalog
            .search_artists(&artist.name, self.config.fuzzy_search_limit)
            .await?;

        Ok(rank(candidates, |c| similarity(&artist.name, &c.name))
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
