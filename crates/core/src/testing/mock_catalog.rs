//! Mock target catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogClient, CatalogError, TargetCandidate};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCatalogQuery {
    LookupByUniqueId { code: String },
    SearchTracks { query: String, limit: u32 },
    SearchAlbums { query: String, limit: u32 },
    SearchArtists { query: String, limit: u32 },
}

/// Mock implementation of the CatalogClient trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable track/album/artist candidates
/// - Track queries for assertions
/// - Simulate failures and panics
///
/// Searches return every stored candidate whose name, or one of whose
/// artists, appears in the query (case-insensitive), in insertion order and
/// capped at the limit. ISRC lookups match the tracks' `unique_id`.
#[derive(Debug)]
pub struct MockCatalogClient {
    tracks: Arc<RwLock<Vec<TargetCandidate>>>,
    albums: Arc<RwLock<Vec<TargetCandidate>>>,
    artists: Arc<RwLock<Vec<TargetCandidate>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
    /// If set, every query containing this text panics.
    panic_on: Arc<RwLock<Option<String>>>,
}

impl Default for MockCatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogClient {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            tracks: Arc::new(RwLock::new(Vec::new())),
            albums: Arc::new(RwLock::new(Vec::new())),
            artists: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic_on: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Add a track candidate.
    pub async fn add_track(&self, track: TargetCandidate) {
        self.tracks.write().await.push(track);
    }

    /// Add an album candidate.
    pub async fn add_album(&self, album: TargetCandidate) {
        self.albums.write().await.push(album);
    }

    /// Add an artist candidate.
    pub async fn add_artist(&self, artist: TargetCandidate) {
        self.artists.write().await.push(artist);
    }

    /// Remove all candidates.
    pub async fn clear(&self) {
        self.tracks.write().await.clear();
        self.albums.write().await.clear();
        self.artists.write().await.clear();
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Get the number of queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Failure Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Panic on every query or code containing `text` (case-insensitive).
    pub async fn panic_on(&self, text: &str) {
        *self.panic_on.write().await = Some(text.to_lowercase());
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }

    async fn check_panic(&self, query: &str) {
        if let Some(text) = self.panic_on.read().await.as_deref() {
            if query.to_lowercase().contains(text) {
                panic!("mock catalog panic on query: {}", query);
            }
        }
    }

    /// Record a query, then apply any injected failure.
    async fn begin(&self, query: RecordedCatalogQuery, text: &str) -> Result<(), CatalogError> {
        self.queries.write().await.push(query);
        self.check_panic(text).await;
        match self.take_error().await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn search_in(items: &[TargetCandidate], query: &str, limit: u32) -> Vec<TargetCandidate> {
        let query_lower = query.to_lowercase();
        items
            .iter()
            .filter(|c| {
                query_lower.contains(&c.name.to_lowercase())
                    || c
                        .artists
                        .iter()
                        .any(|a| query_lower.contains(&a.to_lowercase()))
            })
            .take(limit as usize)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup_by_unique_id(
        &self,
        code: &str,
    ) -> Result<Option<TargetCandidate>, CatalogError> {
        self.begin(
            RecordedCatalogQuery::LookupByUniqueId {
                code: code.to_string(),
            },
            code,
        )
        .await?;

        Ok(self
            .tracks
            .read()
            .await
            .iter()
            .find(|t| {
                t.unique_id
                    .as_deref()
                    .is_some_and(|id| id.eq_ignore_ascii_case(code.trim()))
            })
            .cloned())
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        self.begin(
            RecordedCatalogQuery::SearchTracks {
                query: query.to_string(),
                limit,
            },
            query,
        )
        .await?;

        Ok(Self::search_in(&self.tracks.read().await, query, limit))
    }

    async fn search_albums(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        self.begin(
            RecordedCatalogQuery::SearchAlbums {
                query: query.to_string(),
                limit,
            },
            query,
        )
        .await?;

        Ok(Self::search_in(&self.albums.read().await, query, limit))
    }

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        self.begin(
            RecordedCatalogQuery::SearchArtists {
                query: query.to_string(),
                limit,
            },
            query,
        )
        .await?;

        Ok(Self::search_in(&self.artists.read().await, query, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_search_filters_and_preserves_order() {
        let catalog = MockCatalogClient::new();
        catalog
            .add_track(fixtures::candidate_track("t1", "Yesterday", "The Beatles", 125_000))
            .await;
        catalog
            .add_track(fixtures::candidate_track("t2", "Creep", "Radiohead", 238_000))
            .await;
        catalog
            .add_track(fixtures::candidate_track("t3", "Let It Be", "The Beatles", 243_000))
            .await;

        let results = catalog.search_tracks("let it be the beatles", 10).await.unwrap();
        let ids: Vec<_> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);

        let capped = catalog.search_tracks("the beatles", 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_by_unique_id() {
        let catalog = MockCatalogClient::new();
        let mut track = fixtures::candidate_track("t1", "Song", "Artist", 1_000);
        track.unique_id = Some("GBUM71029604".to_string());
        catalog.add_track(track).await;

        assert!(catalog.lookup_by_unique_id("gbum71029604").await.unwrap().is_some());
        assert!(catalog.lookup_by_unique_id("USUM00000000").await.unwrap().is_none());
        assert_eq!(catalog.query_count().await, 2);
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let catalog = MockCatalogClient::new();
        catalog
            .set_next_error(CatalogError::NotFound("gone".to_string()))
            .await;

        assert!(catalog.search_artists("anyone", 5).await.is_err());
        assert!(catalog.search_artists("anyone", 5).await.is_ok());
        assert_eq!(
            catalog.recorded_queries().await[0],
            RecordedCatalogQuery::SearchArtists {
                query: "anyone".to_string(),
                limit: 5
            }
        );
    }

    #[tokio::test]
    #[should_panic(expected = "mock catalog panic")]
    async fn test_panic_injection() {
        let catalog = MockCatalogClient::new();
        catalog.panic_on("boom").await;
        let _ = catalog.search_tracks("Boom Boom", 5).await;
    }
}
