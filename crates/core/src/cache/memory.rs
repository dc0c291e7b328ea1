//! In-memory match cache, for tests and throwaway runs.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::types::normalize_code;
use super::{CacheEntry, CacheError, CacheStats, MatchCache};
use crate::matcher::EntityKind;

/// Match cache held in a hash map. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryMatchCache {
    entries: RwLock<HashMap<(EntityKind, String), CacheEntry>>,
}

impl MemoryMatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<(EntityKind, String), CacheEntry>>, CacheError> {
        self.entries
            .read()
            .map_err(|_| CacheError::Internal("cache lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<(EntityKind, String), CacheEntry>>, CacheError> {
        self.entries
            .write()
            .map_err(|_| CacheError::Internal("cache lock poisoned".to_string()))
    }
}

impl MatchCache for MemoryMatchCache {
    fn get(&self, kind: EntityKind, source_id: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.read()?.get(&(kind, source_id.to_string())).cloned())
    }

    fn get_by_unique_id(&self, code: &str) -> Result<Option<CacheEntry>, CacheError> {
        let code = normalize_code(code);
        Ok(self
            .read()?
            .values()
            .filter(|e| e.unique_id.as_deref() == Some(code.as_str()))
            .max_by_key(|e| e.cached_at)
            .cloned())
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut stored = entry.clone();
        stored.unique_id = stored.unique_id.as_deref().map(normalize_code);
        self.write()?
            .insert((stored.kind, stored.source_id.clone()), stored);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.write()?.clear();
        Ok(())
    }

    fn evict_before(&self, cutoff: DateTime<Utc>) -> Result<u64, CacheError> {
        let mut entries = self.write()?;
        let before = entries.len();
        entries.retain(|_, e| e.cached_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self.read()?;
        Ok(CacheStats {
            entries: entries.len() as u64,
            matched_entries: entries.values().filter(|e| e.target.is_some()).count() as u64,
            oldest_entry: entries.values().map(|e| e.cached_at).min(),
            newest_entry: entries.values().map(|e| e.cached_at).max(),
        })
    }
}
