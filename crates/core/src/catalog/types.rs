//! Types returned by target catalog queries.

use serde::{Deserialize, Serialize};

use crate::similarity::release_year;

/// An entity in the target catalog being considered as a match.
///
/// Candidates are produced transiently by catalog queries and only persist
/// as part of a match result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetCandidate {
    /// Identifier in the target catalog.
    pub id: String,
    /// Display name or title.
    pub name: String,
    /// Artist names, primary artist first.
    #[serde(default)]
    pub artists: Vec<String>,
    /// Unique industry identifier (ISRC for recordings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Duration in milliseconds (tracks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Containing album title (tracks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Release date, `YYYY-MM-DD` or partial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl TargetCandidate {
    /// Create a candidate with only an id, a name and its artists.
    pub fn new(id: impl Into<String>, name: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists,
            unique_id: None,
            duration_ms: None,
            album: None,
            release_date: None,
        }
    }

    /// The first credited artist, if any.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// Release year parsed from the release date.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.as_deref().and_then(release_year)
    }
}

/// The catalog operations the engine performs, used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOperation {
    LookupByUniqueId,
    SearchTracks,
    SearchAlbums,
    SearchArtists,
}

impl CatalogOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogOperation::LookupByUniqueId => "lookup_by_unique_id",
            CatalogOperation::SearchTracks => "search_tracks",
            CatalogOperation::SearchAlbums => "search_albums",
            CatalogOperation::SearchArtists => "search_artists",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_artist_and_year() {
        let mut candidate = TargetCandidate::new(
            "rel-1",
            "Abbey Road",
            vec!["The Beatles".to_string(), "George Martin".to_string()],
        );
        candidate.release_date = Some("1969-09-26".to_string());

        assert_eq!(candidate.primary_artist(), Some("The Beatles"));
        assert_eq!(candidate.release_year(), Some(1969));
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let candidate: TargetCandidate =
            serde_json::from_str(r#"{"id": "a1", "name": "Radiohead"}"#).unwrap();
        assert!(candidate.artists.is_empty());
        assert_eq!(candidate.primary_artist(), None);
        assert_eq!(candidate.release_year(), None);
    }

    #[test]
    fn test_optional_fields_skipped_when_absent() {
        let candidate = TargetCandidate::new("t1", "Song", vec![]);
        let json = serde_json::to_string(&candidate).unwrap();
        assert_eq!(json, r#"{"id":"t1","name":"Song","artists":[]}"#);
    }
}
