//! The matching engine facade.

use std::sync::Arc;

use tracing::info;

use super::album::AlbumMatcher;
use super::artist::ArtistMatcher;
use super::batch::{guarded, match_all, BatchProgress};
use super::config::MatchingConfig;
use super::statistics::{statistics, MatchStatistics};
use super::track::TrackMatcher;
use super::types::{MatchResult, SourceAlbum, SourceArtist, SourceTrack};
use super::waterfall::run_waterfall;
use crate::cache::{CacheError, CacheStats, MatchCache};
use crate::catalog::CatalogGateway;

/// Matches source tracks, albums and artists against the target catalog.
///
/// All three matchers share one [`CatalogGateway`] (and so one rate limiter)
/// and one [`MatchCache`]. Matching never fails: every error is recovered
/// into a tier miss, a cache miss, or an Unmatched result.
pub struct MatchEngine {
    tracks: TrackMatcher,
    albums: AlbumMatcher,
    artists: ArtistMatcher,
    cache: Arc<dyn MatchCache>,
    config: MatchingConfig,
}

impl MatchEngine {
    pub fn new(catalog: CatalogGateway, cache: Arc<dyn MatchCache>, config: MatchingConfig) -> Self {
        info!(
            catalog = catalog.catalog_name(),
            batch_concurrency = config.batch_concurrency,
            "Creating match engine"
        );
        Self {
            tracks: TrackMatcher::new(catalog.clone(), config.clone()),
            albums: AlbumMatcher::new(catalog.clone(), config.clone()),
            artists: ArtistMatcher::new(catalog, config.clone()),
            cache,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    // =========================================================================
    // Single entities
    // =========================================================================

    pub async fn match_track(&self, track: SourceTrack) -> MatchResult<SourceTrack> {
        let fallback = track.clone();
        guarded(fallback, run_waterfall(&self.tracks, self.cache.as_ref(), track)).await
    }

    pub async fn match_album(&self, album: SourceAlbum) -> MatchResult<SourceAlbum> {
        let fallback = album.clone();
        guarded(fallback, run_waterfall(&self.albums, self.cache.as_ref(), album)).await
    }

    pub async fn match_artist(&self, artist: SourceArtist) -> MatchResult<SourceArtist> {
        let fallback = artist.clone();
        guarded(fallback, run_waterfall(&self.artists, self.cache.as_ref(), artist)).await
    }

    // =========================================================================
    // Batches
    // =========================================================================

    pub async fn match_tracks<F>(
        &self,
        tracks: Vec<SourceTrack>,
        on_progress: F,
    ) -> Vec<MatchResult<SourceTrack>>
    where
        F: FnMut(BatchProgress) + Send,
    {
        match_all(
            &self.tracks,
            self.cache.as_ref(),
            tracks,
            self.config.batch_concurrency,
            on_progress,
        )
        .await
    }

    pub async fn match_albums<F>(
        &self,
        albums: Vec<SourceAlbum>,
        on_progress: F,
    ) -> Vec<MatchResult<SourceAlbum>>
    where
        F: FnMut(BatchProgress) + Send,
    {
        match_all(
            &self.albums,
            self.cache.as_ref(),
            albums,
            self.config.batch_concurrency,
            on_progress,
        )
        .await
    }

    pub async fn match_artists<F>(
        &self,
        artists: Vec<SourceArtist>,
        on_progress: F,
    ) -> Vec<MatchResult<SourceArtist>>
    where
        F: FnMut(BatchProgress) + Send,
    {
        match_all(
            &self.artists,
            self.cache.as_ref(),
            artists,
            self.config.batch_concurrency,
            on_progress,
        )
        .await
    }

    /// Aggregate statistics for a set of results.
    pub fn statistics<S>(&self, results: &[MatchResult<S>]) -> MatchStatistics {
        statistics(results)
    }

    // =========================================================================
    // Cache maintenance
    // =========================================================================

    pub fn clear_cache(&self) -> Result<(), CacheError> {
        self.cache.clear()?;
        info!("Match cache cleared");
        Ok(())
    }

    /// Remove cache entries older than `days` days.
    pub fn evict_cache(&self, days: u32) -> Result<u64, CacheError> {
        let removed = self.cache.evict_older_than(days)?;
        info!(days, removed, "Evicted stale match cache entries");
        Ok(removed)
    }

    pub fn cache_stats(&self) -> Result<CacheStats, CacheError> {
        self.cache.stats()
    }
}
