//! Subcommand implementations.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use tunebridge_core::{
    metrics, BatchProgress, CatalogGateway, Config, MatchCache, MatchEngine, MatchResult,
    MatchStatistics, MusicBrainzCatalog, RateLimiter, SqliteMatchCache,
};

use crate::cli::{CacheAction, EntityArg};

/// Build an engine over MusicBrainz and the configured SQLite cache.
pub fn build_engine(config: &Config) -> Result<MatchEngine> {
    let catalog = MusicBrainzCatalog::new(config.musicbrainz.clone())
        .context("Failed to create MusicBrainz client")?;
    let limiter = Arc::new(
        RateLimiter::new(config.rate_limit.clone()).context("Invalid rate limit configuration")?,
    );
    let cache = SqliteMatchCache::new(&config.cache.path)
        .with_context(|| format!("Failed to open match cache at {:?}", config.cache.path))?;
    info!("Match cache: {:?}", config.cache.path);

    Ok(MatchEngine::new(
        CatalogGateway::new(Arc::new(catalog), limiter),
        Arc::new(cache),
        config.matching.clone(),
    ))
}

pub async fn cmd_match(
    engine: &MatchEngine,
    kind: EntityArg,
    input: &Path,
    output: Option<&Path>,
) -> Result<MatchStatistics> {
    let stats = match kind {
        EntityArg::Tracks => {
            let tracks = read_entities(input)?;
            let results = engine.match_tracks(tracks, log_progress).await;
            write_results(&results, output)?;
            engine.statistics(&results)
        }
        EntityArg::Albums => {
            let albums = read_entities(input)?;
            let results = engine.match_albums(albums, log_progress).await;
            write_results(&results, output)?;
            engine.statistics(&results)
        }
        EntityArg::Artists => {
            let artists = read_entities(input)?;
            let results = engine.match_artists(artists, log_progress).await;
            write_results(&results, output)?;
            engine.statistics(&results)
        }
    };

    print_statistics(&stats);
    Ok(stats)
}

pub fn cmd_cache(config: &Config, action: CacheAction) -> Result<()> {
    let cache = SqliteMatchCache::new(&config.cache.path)
        .with_context(|| format!("Failed to open match cache at {:?}", config.cache.path))?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats().context("Failed to read cache stats")?;
            println!("Entries:         {}", stats.entries);
            println!("Matched entries: {}", stats.matched_entries);
            if let (Some(oldest), Some(newest)) = (stats.oldest_entry, stats.newest_entry) {
                println!("Oldest entry:    {}", oldest.to_rfc3339());
                println!("Newest entry:    {}", newest.to_rfc3339());
            }
        }
        CacheAction::Clear => {
            cache.clear().context("Failed to clear cache")?;
            println!("Cache cleared");
        }
        CacheAction::Evict { days } => {
            let days = days.unwrap_or(config.cache.retention_days);
            let removed = cache
                .evict_older_than(days)
                .context("Failed to evict cache entries")?;
            println!("Removed {} entries older than {} days", removed, days);
        }
    }

    Ok(())
}

/// Print metrics to stderr; stdout may be carrying the JSON results.
pub fn print_metrics() -> Result<()> {
    write_metrics(io::stderr().lock())
}

fn write_metrics<W: Write>(mut out: W) -> Result<()> {
    out.write_all(metrics::encode_metrics().as_bytes())
        .context("Failed to write metrics")
}

fn read_entities<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn write_results<S: Serialize>(results: &[MatchResult<S>], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {} results to {:?}", results.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn log_progress(progress: BatchProgress) {
    info!(
        "[{}/{}] {}",
        progress.current,
        progress.total,
        progress.label.unwrap_or_default()
    );
}

fn print_statistics(stats: &MatchStatistics) {
    eprintln!();
    eprintln!("Total:     {}", stats.total);
    eprintln!(
        "Matched:   {} ({:.1}%)",
        stats.matched,
        stats.match_rate() * 100.0
    );
    eprintln!("Unmatched: {}", stats.unmatched);
    eprintln!(
        "By method: unique_id={} exact={} fuzzy={}",
        stats.by_method.unique_id, stats.by_method.exact, stats.by_method.fuzzy
    );
    eprintln!(
        "Confidence: high={} medium={} low={}",
        stats.confidence.high, stats.confidence.medium, stats.confidence.low
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use tunebridge_core::{SourceAlbum, SourceTrack};

    #[test]
    fn test_read_entities_with_optional_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "1", "name": "Let It Be", "artists": ["The Beatles"], "isrc": "GBAYE0601690", "duration_ms": 243000}},
                {{"id": "2", "name": "Creep", "artists": ["Radiohead"]}}
            ]"#
        )
        .unwrap();

        let tracks: Vec<SourceTrack> = read_entities(file.path()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].isrc.as_deref(), Some("GBAYE0601690"));
        assert!(tracks[1].duration_ms.is_none());
    }

    #[test]
    fn test_read_entities_rejects_wrong_shape() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"id": "1"}}"#).unwrap();

        let result: Result<Vec<SourceAlbum>> = read_entities(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_metrics_renders_prometheus_text() {
        let mut out = Vec::new();
        write_metrics(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("tunebridge_rate_limiter_queue_depth"));
    }

    #[test]
    fn test_cache_evict_with_huge_age_is_a_no_op() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.path = temp_dir.path().join("cache.db");

        cmd_cache(&config, CacheAction::Evict { days: Some(u32::MAX) }).unwrap();
    }

    #[test]
    fn test_cache_commands_on_fresh_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.path = temp_dir.path().join("cache.db");

        cmd_cache(&config, CacheAction::Stats).unwrap();
        cmd_cache(&config, CacheAction::Evict { days: Some(1) }).unwrap();
        cmd_cache(&config, CacheAction::Clear).unwrap();
        assert!(config.cache.path.exists());
    }
}
