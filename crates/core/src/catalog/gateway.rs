//! Rate-limited access to a [`CatalogClient`].

use std::sync::Arc;

use tracing::{debug, warn};

use super::{CatalogClient, CatalogError, CatalogOperation, TargetCandidate};
use crate::metrics;
use crate::rate_limiter::{RateLimiter, RateLimiterError};

/// Routes every catalog call through the shared [`RateLimiter`].
///
/// Matchers hold a gateway rather than the raw client so that no code path
/// can reach the catalog without being throttled.
#[derive(Clone)]
pub struct CatalogGateway {
    client: Arc<dyn CatalogClient>,
    limiter: Arc<RateLimiter>,
}

impl CatalogGateway {
    pub fn new(client: Arc<dyn CatalogClient>, limiter: Arc<RateLimiter>) -> Self {
        Self { client, limiter }
    }

    /// Name of the underlying catalog.
    pub fn catalog_name(&self) -> &str {
        self.client.name()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Look up a recording by unique identifier code.
    pub async fn lookup_by_unique_id(
        &self,
        code: &str,
    ) -> Result<Option<TargetCandidate>, CatalogError> {
        let client = Arc::clone(&self.client);
        let code = code.to_string();

        let result = self
            .limiter
            .execute(move || async move { client.lookup_by_unique_id(&code).await })
            .await;

        record(CatalogOperation::LookupByUniqueId, flatten(result))
    }

    /// Free-text track search.
    pub async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        self.log_search(CatalogOperation::SearchTracks, query, limit);
        let client = Arc::clone(&self.client);
        let query = query.to_string();

        let result = self
            .limiter
            .execute(move || async move { client.search_tracks(&query, limit).await })
            .await;

        record(CatalogOperation::SearchTracks, flatten(result))
    }

    /// Free-text album search.
    pub async fn search_albums(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        self.log_search(CatalogOperation::SearchAlbums, query, limit);
        let client = Arc::clone(&self.client);
        let query = query.to_string();

        let result = self
            .limiter
            .execute(move || async move { client.search_albums(&query, limit).await })
            .await;

        record(CatalogOperation::SearchAlbums, flatten(result))
    }

    /// Free-text artist search.
    pub async fn search_artists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        self.log_search(CatalogOperation::SearchArtists, query, limit);
        let client = Arc::clone(&self.client);
        let query = query.to_string();

        let result = self
            .limiter
            .execute(move || async move { client.search_artists(&query, limit).await })
            .await;

        record(CatalogOperation::SearchArtists, flatten(result))
    }

    fn log_search(&self, operation: CatalogOperation, query: &str, limit: u32) {
        debug!(
            "Catalog {} via {}: query='{}', limit={}",
            operation.as_str(),
            self.client.name(),
            query,
            limit
        );
    }
}

fn flatten<T>(
    result: Result<Result<T, CatalogError>, RateLimiterError>,
) -> Result<T, CatalogError> {
    result.map_err(CatalogError::from).and_then(|inner| inner)
}

fn record<T>(
    operation: CatalogOperation,
    result: Result<T, CatalogError>,
) -> Result<T, CatalogError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            warn!("Catalog call {} failed: {}", operation.as_str(), e);
            "error"
        }
    };
    metrics::CATALOG_CALLS
        .with_label_values(&[operation.as_str(), outcome])
        .inc();
    result
}
