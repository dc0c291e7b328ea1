//! Testing utilities and mock implementations.
//!
//! This module provides a mock target catalog and fixtures, allowing the
//! matchers to be exercised end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tunebridge_core::testing::{fixtures, MockCatalogClient};
//!
//! let catalog = MockCatalogClient::new();
//! catalog
//!     .add_track(fixtures::candidate_track("t1", "Let It Be", "The Beatles", 243_000))
//!     .await;
//!
//! // Wrap in a CatalogGateway and hand it to a MatchEngine...
//! ```

mod mock_catalog;

pub use mock_catalog::{MockCatalogClient, RecordedCatalogQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::TargetCandidate;
    use crate::matcher::{SourceAlbum, SourceArtist, SourceTrack};

    /// Create a source track with a single artist and no ISRC.
    pub fn source_track(id: &str, name: &str, artist: &str, duration_ms: u64) -> SourceTrack {
        SourceTrack {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![artist.to_string()],
            isrc: None,
            duration_ms: Some(duration_ms),
            album: None,
        }
    }

    /// Create a source track carrying an ISRC.
    pub fn source_track_with_isrc(
        id: &str,
        name: &str,
        artist: &str,
        duration_ms: u64,
        isrc: &str,
    ) -> SourceTrack {
        SourceTrack {
            isrc: Some(isrc.to_string()),
            ..source_track(id, name, artist, duration_ms)
        }
    }

    /// Create a source album released on January 1st of `year`.
    pub fn source_album(id: &str, name: &str, artist: &str, year: i32) -> SourceAlbum {
        SourceAlbum {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![artist.to_string()],
            release_date: Some(format!("{}-01-01", year)),
        }
    }

    /// Create a source artist.
    pub fn source_artist(id: &str, name: &str) -> SourceArtist {
        SourceArtist {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Create a target track candidate.
    pub fn candidate_track(id: &str, name: &str, artist: &str, duration_ms: u64) -> TargetCandidate {
        TargetCandidate {
            duration_ms: Some(duration_ms),
            ..TargetCandidate::new(id, name, vec![artist.to_string()])
        }
    }

    /// Create a target album candidate.
    pub fn candidate_album(id: &str, name: &str, artist: &str, year: i32) -> TargetCandidate {
        TargetCandidate {
            release_date: Some(format!("{}-06-15", year)),
            ..TargetCandidate::new(id, name, vec![artist.to_string()])
        }
    }

    /// Create a target artist candidate.
    pub fn candidate_artist(id: &str, name: &str) -> TargetCandidate {
        TargetCandidate::new(id, name, vec![name.to_string()])
    }
}
