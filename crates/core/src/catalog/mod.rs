//! Target catalog boundary.
//!
//! The engine only ever talks to the target catalog through the
//! [`CatalogClient`] trait, and only through a [`CatalogGateway`], which
//! routes every call over the shared rate limiter.

mod gateway;
mod musicbrainz;
mod types;

pub use gateway::CatalogGateway;
pub use musicbrainz::{MusicBrainzCatalog, MusicBrainzConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::rate_limiter::RateLimiterError;

/// Errors that can occur when querying the target catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (includes client-side timeouts).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Provider-side rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing base URL, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// The call never reached the catalog.
    #[error("Rate limiter error: {0}")]
    Limiter(#[from] RateLimiterError),
}

/// Query client for the target catalog.
///
/// Implementations own their own timeouts; a timed-out call is reported as
/// an error like any other failed call.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Name of this catalog for logging.
    fn name(&self) -> &str;

    /// Look up a recording by its unique identifier code (ISRC).
    ///
    /// Returns `Ok(None)` when the catalog has no recording with that code.
    async fn lookup_by_unique_id(
        &self,
        code: &str,
    ) -> Result<Option<TargetCandidate>, CatalogError>;

    /// Free-text track search.
    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError>;

    /// Free-text album search.
    async fn search_albums(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError>;

    /// Free-text artist search.
    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::ApiError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - unavailable");

        let err = CatalogError::from(RateLimiterError::Closed);
        assert_eq!(err.to_string(), "Rate limiter error: Rate limiter is closed");
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(CatalogOperation::LookupByUniqueId.as_str(), "lookup_by_unique_id");
        assert_eq!(CatalogOperation::SearchArtists.as_str(), "search_artists");
    }
}
