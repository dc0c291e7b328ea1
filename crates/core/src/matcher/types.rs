//! Source entities and match results.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::catalog::TargetCandidate;
use crate::similarity::release_year;

/// Confidence of a unique-identifier match.
pub const UNIQUE_ID_CONFIDENCE: f64 = 1.0;

/// Fixed confidence of an exact match.
pub const EXACT_MATCH_CONFIDENCE: f64 = 0.99;

/// The kinds of entity the engine matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Track,
    Album,
    Artist,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Track => "track",
            EntityKind::Album => "album",
            EntityKind::Artist => "artist",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(EntityKind::Track),
            "album" => Ok(EntityKind::Album),
            "artist" => Ok(EntityKind::Artist),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

/// Whether a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Unmatched,
}

/// Which waterfall tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    UniqueId,
    Exact,
    Fuzzy,
    Unmatched,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::UniqueId => "unique_id",
            MatchMethod::Exact => "exact",
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::Unmatched => "unmatched",
        }
    }
}

impl FromStr for MatchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unique_id" => Ok(MatchMethod::UniqueId),
            "exact" => Ok(MatchMethod::Exact),
            "fuzzy" => Ok(MatchMethod::Fuzzy),
            "unmatched" => Ok(MatchMethod::Unmatched),
            other => Err(format!("unknown match method: {}", other)),
        }
    }
}

/// An entity extracted from the source catalog.
pub trait SourceEntity: Clone + Send + Sync + 'static {
    /// The kind of entity this is.
    const KIND: EntityKind;

    /// Identifier, stable within the source catalog.
    fn id(&self) -> &str;

    /// Display name or title.
    fn name(&self) -> &str;

    /// Unique industry identifier code, when the kind carries one.
    fn unique_id(&self) -> Option<&str> {
        None
    }

    /// Human-readable label for progress reporting.
    fn label(&self) -> String;

    /// Reject entities that violate the caller contract.
    fn validate(&self) -> Result<(), String> {
        if self.name().trim().is_empty() {
            return Err("missing display name".to_string());
        }
        Ok(())
    }
}

/// A track in the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceTrack {
    pub id: String,
    pub name: String,
    /// Contributing artists, primary artist first.
    #[serde(default)]
    pub artists: Vec<String>,
    /// ISRC, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Title of the containing album.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl SourceTrack {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

impl SourceEntity for SourceTrack {
    const KIND: EntityKind = EntityKind::Track;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> Option<&str> {
        self.isrc.as_deref().map(str::trim).filter(|code| !code.is_empty())
    }

    fn label(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} - {}", artist, self.name),
            None => self.name.clone(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("missing display name".to_string());
        }
        if self.primary_artist().map_or(true, |a| a.trim().is_empty()) {
            return Err("missing primary artist".to_string());
        }
        Ok(())
    }
}

/// An album in the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    /// Release date, `YYYY-MM-DD` or partial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl SourceAlbum {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date.as_deref().and_then(release_year)
    }
}

impl SourceEntity for SourceAlbum {
    const KIND: EntityKind = EntityKind::Album;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} - {}", artist, self.name),
            None => self.name.clone(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("missing display name".to_string());
        }
        if self.primary_artist().map_or(true, |a| a.trim().is_empty()) {
            return Err("missing primary artist".to_string());
        }
        Ok(())
    }
}

/// An artist in the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceArtist {
    pub id: String,
    pub name: String,
}

impl SourceEntity for SourceArtist {
    const KIND: EntityKind = EntityKind::Artist;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// The outcome of matching one source entity.
///
/// `status == Matched` exactly when `target` is set and `confidence > 0`.
/// Results are never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult<S> {
    pub source: S,
    pub target: Option<TargetCandidate>,
    pub status: MatchStatus,
    pub method: MatchMethod,
    pub confidence: f64,
    /// Starting points for a human reviewer; only set on unmatched tracks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<TargetCandidate>,
    /// Why the entity was rejected or failed, when it never reached the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<S: SourceEntity> MatchResult<S> {
    /// A successful match.
    pub fn matched(
        source: S,
        target: TargetCandidate,
        method: MatchMethod,
        confidence: f64,
    ) -> Self {
        debug_assert!(method != MatchMethod::Unmatched);
        debug_assert!(confidence > 0.0 && confidence <= 1.0);
        Self {
            source,
            target: Some(target),
            status: MatchStatus::Matched,
            method,
            confidence,
            suggestions: Vec::new(),
            note: None,
        }
    }

    /// No tier produced an acceptable candidate.
    pub fn unmatched(source: S, suggestions: Vec<TargetCandidate>) -> Self {
        Self {
            source,
            target: None,
            status: MatchStatus::Unmatched,
            method: MatchMethod::Unmatched,
            confidence: 0.0,
            suggestions,
            note: None,
        }
    }

    /// Unmatched without attempting any tier, with the reason attached.
    pub fn rejected(source: S, note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::unmatched(source, Vec::new())
        }
    }

    /// Rebuild a result from a cache entry.
    pub fn from_cache_entry(source: S, entry: CacheEntry) -> Self {
        match entry.target {
            Some(target) if entry.method != MatchMethod::Unmatched && entry.confidence > 0.0 => {
                Self::matched(source, target, entry.method, entry.confidence)
            }
            _ => Self::unmatched(source, entry.suggestions),
        }
    }

    /// The cache entry recording this result.
    pub fn to_cache_entry(&self, cached_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            kind: S::KIND,
            source_id: self.source.id().to_string(),
            unique_id: self.source.unique_id().map(str::to_string),
            target: self.target.clone(),
            method: self.method,
            confidence: self.confidence,
            suggestions: self.suggestions.clone(),
            cached_at,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.status == MatchStatus::Matched
    }
}
