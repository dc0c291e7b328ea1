pub mod cache;
pub mod catalog;
pub mod config;
pub mod matcher;
pub mod metrics;
pub mod rate_limiter;
pub mod similarity;
pub mod testing;

pub use cache::{CacheEntry, CacheError, CacheStats, MatchCache, MemoryMatchCache, SqliteMatchCache};
pub use catalog::{
    CatalogClient, CatalogError, CatalogGateway, MusicBrainzCatalog, MusicBrainzConfig,
    TargetCandidate,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, CacheConfig,
    Config, ConfigError,
};
pub use matcher::{
    BatchProgress, EntityKind, MatchEngine, MatchMethod, MatchResult, MatchStatistics,
    MatchStatus, MatchingConfig, SourceAlbum, SourceArtist, SourceEntity, SourceTrack,
};
pub use rate_limiter::{RateLimitConfig, RateLimiter, RateLimiterError};
