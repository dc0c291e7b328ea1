use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::MusicBrainzConfig;
use crate::matcher::MatchingConfig;
use crate::rate_limiter::RateLimitConfig;

/// Root configuration. Every section has defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub musicbrainz: MusicBrainzConfig,
}

/// Match cache configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    /// SQLite database file.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Age after which `cache evict` removes entries.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("tunebridge.db")
}

fn default_retention_days() -> u32 {
    30
}
