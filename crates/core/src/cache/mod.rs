//! Match cache - previously computed match outcomes.
//!
//! Every completed match attempt, including unmatched ones, is stored so that
//! repeated passes over the same catalog never repeat an outbound search.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryMatchCache;
pub use sqlite::SqliteMatchCache;
pub use types::*;

use chrono::{DateTime, Duration, Utc};

use crate::matcher::EntityKind;

/// Trait for match cache storage.
///
/// Implementations must be safe for concurrent use. Writes to the same key
/// are last-write-wins.
pub trait MatchCache: Send + Sync {
    /// Get the entry for a source entity.
    fn get(&self, kind: EntityKind, source_id: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Get the most recent entry recorded for a unique identifier code.
    fn get_by_unique_id(&self, code: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Insert or replace the entry for `(entry.kind, entry.source_id)`.
    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Remove every entry.
    fn clear(&self) -> Result<(), CacheError>;

    /// Remove entries cached before `cutoff`. Returns the number removed.
    fn evict_before(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError>;

    /// Get cache statistics.
    fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Remove entries older than `days` days. Returns the number removed.
    ///
    /// A cutoff earlier than the representable date range removes nothing.
    fn evict_older_than(&self, days: u32) -> Result<u64, CacheError> {
        let cutoff = Duration::try_days(i64::from(days))
            .and_then(|age| Utc::now().checked_sub_signed(age));
        match cutoff {
            Some(cutoff) => self.evict_before(cutoff),
            None => Ok(0),
        }
    }
}
