//! MusicBrainz-backed target catalog.
//!
//! MusicBrainz requires:
//! - User-Agent header with application name/version and contact info
//! - Rate limiting: 1 request per second (enforced by the shared rate limiter,
//!   not by this client)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CatalogClient, CatalogError, TargetCandidate};

/// MusicBrainz API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MusicBrainzConfig {
    /// User-Agent string (required by MusicBrainz).
    /// Format: "AppName/Version ( contact@example.com )"
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Base URL (default: https://musicbrainz.org/ws/2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!(
        "Tunebridge/{} ( https://github.com/tunebridge )",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_timeout() -> u64 {
    30
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// MusicBrainz as a target catalog: ISRC lookup plus recording, release and
/// artist search.
pub struct MusicBrainzCatalog {
    client: Client,
    base_url: String,
}

impl MusicBrainzCatalog {
    /// Create a new MusicBrainz catalog client.
    pub fn new(config: MusicBrainzConfig) -> Result<Self, CatalogError> {
        if config.user_agent.trim().is_empty() {
            return Err(CatalogError::NotConfigured(
                "MusicBrainz requires a user agent".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://musicbrainz.org/ws/2".to_string());

        Ok(Self { client, base_url })
    }

    async fn search<T: DeserializeOwned>(
        &self,
        entity: &str,
        query: &str,
        limit: u32,
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, entity);
        let limit = limit.min(100); // MusicBrainz max is 100
        let query = escape_lucene(query);

        debug!("MusicBrainz {} search: query='{}', limit={}", entity, query, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query.as_str()),
                ("fmt", "json"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        parse_response(check_status(response, &query).await?).await
    }
}

#[async_trait]
impl CatalogClient for MusicBrainzCatalog {
    fn name(&self) -> &str {
        "musicbrainz"
    }

    async fn lookup_by_unique_id(
        &self,
        code: &str,
    ) -> Result<Option<TargetCandidate>, CatalogError> {
        let url = format!("{}/isrc/{}", self.base_url, urlencoding::encode(code));

        debug!("MusicBrainz ISRC lookup: isrc={}", code);

        let response = self
            .client
            .get(&url)
            .query(&[("inc", "artist-credits+releases"), ("fmt", "json")])
            .send()
            .await?;

        let lookup: MbIsrcResponse = match check_status(response, code).await {
            Ok(response) => parse_response(response).await?,
            Err(CatalogError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(lookup.recordings.into_iter().next().map(|recording| {
            let mut candidate = TargetCandidate::from(recording);
            candidate.unique_id = Some(code.to_string());
            candidate
        }))
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        let result: MbRecordingSearch = self.search("recording", query, limit).await?;
        Ok(result.recordings.into_iter().map(Into::into).collect())
    }

    async fn search_albums(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        let result: MbReleaseSearch = self.search("release", query, limit).await?;
        Ok(result.releases.into_iter().map(Into::into).collect())
    }

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<TargetCandidate>, CatalogError> {
        let result: MbArtistSearch = self.search("artist", query, limit).await?;
        Ok(result.artists.into_iter().map(Into::into).collect())
    }
}

async fn check_status(response: Response, subject: &str) -> Result<Response, CatalogError> {
    let status = response.status();
    if status == 429 || status == 503 {
        warn!("MusicBrainz rate limit exceeded");
        return Err(CatalogError::RateLimitExceeded);
    }
    if status == 404 {
        return Err(CatalogError::NotFound(subject.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
    response
        .json()
        .await
        .map_err(|e| CatalogError::ParseError(format!("Failed to parse response: {}", e)))
}

/// Escape Lucene query syntax so free text is searched literally.
fn escape_lucene(query: &str) -> String {
    const SPECIAL: &[char] = &[
        '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
        '\\', '/',
    ];

    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ============================================================================
// MusicBrainz API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MbIsrcResponse {
    #[serde(default)]
    recordings: Vec<MbRecording>,
}

#[derive(Debug, Deserialize)]
struct MbRecordingSearch {
    #[serde(default)]
    recordings: Vec<MbRecording>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseSearch {
    #[serde(default)]
    releases: Vec<MbRelease>,
}

#[derive(Debug, Deserialize)]
struct MbArtistSearch {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Deserialize)]
struct MbRecording {
    id: String,
    title: String,
    #[serde(default)]
    length: Option<u64>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    releases: Vec<MbReleaseRef>,
    #[serde(default)]
    isrcs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseRef {
    title: String,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbRelease {
    id: String,
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    #[serde(default)]
    name: Option<String>,
    artist: MbArtist,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

fn credited_names(credits: Vec<MbArtistCredit>) -> Vec<String> {
    credits
        .into_iter()
        .map(|c| c.name.unwrap_or(c.artist.name))
        .filter(|name| !name.is_empty())
        .collect()
}

impl From<MbRecording> for TargetCandidate {
    fn from(r: MbRecording) -> Self {
        let first_release = r.releases.into_iter().next();
        TargetCandidate {
            id: r.id,
            name: r.title,
            artists: credited_names(r.artist_credit),
            unique_id: r.isrcs.into_iter().next(),
            duration_ms: r.length,
            release_date: first_release.as_ref().and_then(|rel| rel.date.clone()),
            album: first_release.map(|rel| rel.title),
        }
    }
}

impl From<MbRelease> for TargetCandidate {
    fn from(r: MbRelease) -> Self {
        TargetCandidate {
            id: r.id,
            name: r.title,
            artists: credited_names(r.artist_credit),
            unique_id: None,
            duration_ms: None,
            album: None,
            release_date: r.date.filter(|d| !d.is_empty()),
        }
    }
}

impl From<MbArtist> for TargetCandidate {
    fn from(a: MbArtist) -> Self {
        let name = a.name.clone();
        TargetCandidate::new(a.id, a.name, vec![name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_lucene() {
        assert_eq!(escape_lucene("AC/DC"), "AC\\/DC");
        assert_eq!(escape_lucene("Help!"), "Help\\!");
        assert_eq!(escape_lucene("plain words"), "plain words");
        assert_eq!(escape_lucene("(What's the Story)"), "\\(What's the Story\\)");
    }

    #[test]
    fn test_recording_conversion() {
        let json = r#"{
            "id": "rec-1",
            "title": "Let It Be",
            "length": 243000,
            "artist-credit": [{"name": "The Beatles", "artist": {"id": "a1", "name": "The Beatles"}}],
            "releases": [{"title": "Let It Be", "date": "1970-05-08"}],
            "isrcs": ["GBAYE0601690"]
        }"#;
        let recording: MbRecording = serde_json::from_str(json).unwrap();
        let candidate = TargetCandidate::from(recording);

        assert_eq!(candidate.id, "rec-1");
        assert_eq!(candidate.artists, vec!["The Beatles".to_string()]);
        assert_eq!(candidate.duration_ms, Some(243_000));
        assert_eq!(candidate.album.as_deref(), Some("Let It Be"));
        assert_eq!(candidate.release_year(), Some(1970));
        assert_eq!(candidate.unique_id.as_deref(), Some("GBAYE0601690"));
    }

    #[test]
    fn test_release_conversion_ignores_empty_date() {
        let json = r#"{
            "id": "rel-1",
            "title": "Abbey Road",
            "artist-credit": [{"artist": {"id": "a1", "name": "The Beatles"}}],
            "date": ""
        }"#;
        let release: MbRelease = serde_json::from_str(json).unwrap();
        let candidate = TargetCandidate::from(release);

        assert_eq!(candidate.name, "Abbey Road");
        assert_eq!(candidate.primary_artist(), Some("The Beatles"));
        assert!(candidate.release_date.is_none());
    }

    #[test]
    fn test_artist_conversion() {
        let artist: MbArtist =
            serde_json::from_str(r#"{"id": "a2", "name": "Radiohead"}"#).unwrap();
        let candidate = TargetCandidate::from(artist);
        assert_eq!(candidate.id, "a2");
        assert_eq!(candidate.artists, vec!["Radiohead".to_string()]);
    }

    #[test]
    fn test_default_config() {
        let config = MusicBrainzConfig::default();
        assert!(config.user_agent.starts_with("Tunebridge/"));
        assert_eq!(config.timeout_secs, 30);
        assert!(MusicBrainzCatalog::new(config).is_ok());
    }

    #[test]
    fn test_missing_user_agent_is_rejected() {
        let config = MusicBrainzConfig {
            user_agent: "  ".to_string(),
            ..MusicBrainzConfig::default()
        };
        assert!(matches!(
            MusicBrainzCatalog::new(config),
            Err(CatalogError::NotConfigured(_))
        ));
    }
}
