//! SQLite-backed match cache implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::normalize_code;
use super::{CacheEntry, CacheError, CacheStats, MatchCache};
use crate::catalog::TargetCandidate;
use crate::matcher::{EntityKind, MatchMethod};

const ENTRY_COLUMNS: &str =
    "kind, source_id, unique_id, target_json, method, confidence, suggestions_json, cached_at";

/// SQLite-backed match cache.
pub struct SqliteMatchCache {
    conn: Mutex<Connection>,
}

impl SqliteMatchCache {
    /// Open the cache, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            -- One row per matched source entity (last write wins)
            CREATE TABLE IF NOT EXISTS match_cache (
                kind TEXT NOT NULL,
                source_id TEXT NOT NULL,
                unique_id TEXT,
                target_json TEXT,
                method TEXT NOT NULL,
                confidence REAL NOT NULL,
                suggestions_json TEXT NOT NULL DEFAULT '[]',
                cached_at TEXT NOT NULL,
                PRIMARY KEY (kind, source_id)
            );

            CREATE INDEX IF NOT EXISTS idx_match_cache_unique_id ON match_cache(unique_id);
            CREATE INDEX IF NOT EXISTS idx_match_cache_cached_at ON match_cache(cached_at);
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Internal("cache connection lock poisoned".to_string()))
    }

    /// Fixed-width timestamps so that text comparison orders chronologically.
    fn format_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CacheError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CacheError::Serialization(format!("bad timestamp '{}': {}", s, e)))
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<RawEntry> {
        Ok(RawEntry {
            kind: row.get(0)?,
            source_id: row.get(1)?,
            unique_id: row.get(2)?,
            target_json: row.get(3)?,
            method: row.get(4)?,
            confidence: row.get(5)?,
            suggestions_json: row.get(6)?,
            cached_at: row.get(7)?,
        })
    }
}

/// A row as stored, before JSON and enum decoding.
struct RawEntry {
    kind: String,
    source_id: String,
    unique_id: Option<String>,
    target_json: Option<String>,
    method: String,
    confidence: f64,
    suggestions_json: String,
    cached_at: String,
}

impl RawEntry {
    fn decode(self) -> Result<CacheEntry, CacheError> {
        let target = self
            .target_json
            .as_deref()
            .map(serde_json::from_str::<TargetCandidate>)
            .transpose()
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let suggestions: Vec<TargetCandidate> = serde_json::from_str(&self.suggestions_json)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        Ok(CacheEntry {
            kind: self.kind.parse::<EntityKind>().map_err(CacheError::Serialization)?,
            source_id: self.source_id,
            unique_id: self.unique_id,
            target,
            method: self.method.parse::<MatchMethod>().map_err(CacheError::Serialization)?,
            confidence: self.confidence,
            suggestions,
            cached_at: SqliteMatchCache::parse_timestamp(&self.cached_at)?,
        })
    }
}

impl MatchCache for SqliteMatchCache {
    fn get(&self, kind: EntityKind, source_id: &str) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM match_cache WHERE kind = ? AND source_id = ?",
                    ENTRY_COLUMNS
                ),
                params![kind.as_str(), source_id],
                Self::row_to_entry,
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        raw.map(RawEntry::decode).transpose()
    }

    fn get_by_unique_id(&self, code: &str) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM match_cache WHERE unique_id = ?
                     ORDER BY cached_at DESC LIMIT 1",
                    ENTRY_COLUMNS
                ),
                params![normalize_code(code)],
                Self::row_to_entry,
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        raw.map(RawEntry::decode).transpose()
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let target_json = entry
            .target
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let suggestions_json = serde_json::to_string(&entry.suggestions)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO match_cache (kind, source_id, unique_id, target_json, method, confidence, suggestions_json, cached_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(kind, source_id) DO UPDATE SET
                unique_id = excluded.unique_id,
                target_json = excluded.target_json,
                method = excluded.method,
                confidence = excluded.confidence,
                suggestions_json = excluded.suggestions_json,
                cached_at = excluded.cached_at",
            params![
                entry.kind.as_str(),
                &entry.source_id,
                entry.unique_id.as_deref().map(normalize_code),
                target_json,
                entry.method.as_str(),
                entry.confidence,
                suggestions_json,
                Self::format_timestamp(&entry.cached_at),
            ],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM match_cache", [])
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(())
    }

    fn evict_before(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM match_cache WHERE cached_at < ?",
                params![Self::format_timestamp(&cutoff)],
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(removed as u64)
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.conn()?;

        let (entries, matched_entries, oldest, newest): (i64, i64, Option<String>, Option<String>) =
            conn.query_row(
                "SELECT COUNT(*), COUNT(target_json), MIN(cached_at), MAX(cached_at) FROM match_cache",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(CacheStats {
            entries: entries as u64,
            matched_entries: matched_entries as u64,
            oldest_entry: oldest.as_deref().map(Self::parse_timestamp).transpose()?,
            newest_entry: newest.as_deref().map(Self::parse_timestamp).transpose()?,
        })
    }
}
