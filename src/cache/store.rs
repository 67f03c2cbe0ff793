//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, a byte-size
//! budget, TTL expiration and index persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::index::{self, IndexSnapshot, INDEX_FILE_NAME};
use crate::cache::{
    value_size, CacheEntry, CacheStats, Clock, EntryInfo, LruTracker, StatsReport, SystemClock,
};
use crate::error::Result;

// == Cache Store ==
/// Size-bounded key/value storage with LRU eviction and TTL support.
///
/// `current_size_bytes` always equals the sum of `size_bytes` over the stored
/// entries; it is maintained on every insertion and removal.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    max_size_bytes: u64,
    current_size_bytes: u64,
    /// Where `save` writes; None for a memory-only store
    index_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    /// Set by any mutation since the last save
    dirty: bool,
}

impl CacheStore {
    // == Constructors ==
    /// Creates a memory-only store on the system clock.
    pub fn new(max_size_bytes: u64) -> Self {
        Self::with_clock(max_size_bytes, Arc::new(SystemClock))
    }

    /// Creates a memory-only store reading time from `clock`.
    pub fn with_clock(max_size_bytes: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_size_bytes,
            current_size_bytes: 0,
            index_path: None,
            clock,
            dirty: false,
        }
    }

    /// Opens the store persisted under `root`.
    ///
    /// A missing index starts an empty store. An unreadable one is logged and
    /// also starts empty; opening never fails.
    pub fn open(root: impl AsRef<Path>, max_size_bytes: u64, clock: Arc<dyn Clock>) -> Self {
        let index_path = root.as_ref().join(INDEX_FILE_NAME);
        let mut store = Self::with_clock(max_size_bytes, clock);

        match index::read_index(&index_path) {
            Ok(Some(snapshot)) => store.restore(snapshot),
            Ok(None) => info!("No cache index at {}, starting empty", index_path.display()),
            Err(err) => warn!("Could not load cache index, starting empty: {}", err),
        }

        store.index_path = Some(index_path);
        store
    }

    fn restore(&mut self, snapshot: IndexSnapshot) {
        let now = self.clock.now();
        let mut expired = 0;
        let mut resized = 0;

        for mut entry in snapshot.entries {
            if entry.is_expired(now) {
                expired += 1;
                continue;
            }
            // Stored sizes are not trusted; the budget is accounted from the value.
            let size = value_size(&entry.value);
            if entry.size_bytes != size {
                resized += 1;
                entry.size_bytes = size;
            }
            self.insert_entry(entry);
        }
        self.stats = snapshot.stats;

        // The budget may have shrunk since the index was written.
        let mut evicted = 0;
        while self.current_size_bytes > self.max_size_bytes && self.entries.len() > 1 {
            self.evict_lru();
            evicted += 1;
        }

        self.dirty = expired > 0 || evicted > 0 || resized > 0 || snapshot.rejected > 0;
        if resized > 0 {
            warn!("Corrected the recorded size of {} cache entries", resized);
        }

        info!(
            "Loaded {} cache entries ({:.1}MB), dropped {} expired, {} unreadable, {} over budget",
            self.entries.len(),
            self.current_size_bytes as f64 / 1024.0 / 1024.0,
            expired,
            snapshot.rejected,
            evicted
        );
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit refreshes the entry's access metadata and makes it the most
    /// recently used. An expired entry is removed and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        self.dirty = true;

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_miss();
            debug!("Cache entry {} expired on read", key);
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }

    // == Set ==
    /// Stores a value under `key` for `ttl_seconds`.
    ///
    /// An existing entry under the same key is replaced. Least recently used
    /// entries are evicted until the new one fits; an entry larger than the
    /// whole budget empties the store and is admitted anyway.
    ///
    /// Returns the number of entries evicted.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl_seconds: u64) -> usize {
        let entry = CacheEntry::new(key.into(), value, ttl_seconds, self.clock.now());
        self.remove_entry(&entry.key);

        let mut evicted = 0;
        while self.current_size_bytes.saturating_add(entry.size_bytes) > self.max_size_bytes
            && self.evict_lru() {
            evicted += 1;
        }

        if entry.size_bytes > self.max_size_bytes {
            warn!(
                "Cache entry {} ({} bytes) exceeds the {} byte budget, admitted alone",
                entry.key, entry.size_bytes, self.max_size_bytes
            );
        }

        self.insert_entry(entry);
        self.dirty = true;
        evicted
    }

    // == Remove ==
    /// Removes a single entry. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        self.dirty |= removed;
        removed
    }

    // == Invalidate ==
    /// Removes every entry, returning how many there were.
    pub fn invalidate_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.current_size_bytes = 0;
        self.dirty |= count > 0;
        count
    }

    /// Removes every entry whose key satisfies `predicate`.
    pub fn invalidate_matching<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }
        self.dirty |= !matching.is_empty();
        matching.len()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        self.dirty |= !expired.is_empty();
        expired.len()
    }

    /// Counts the last hit as a miss. Used when a hit's value could not be
    /// decoded by the caller.
    pub fn record_decode_miss(&mut self) {
        self.stats.reclassify_hit_as_miss();
        self.dirty = true;
    }

    // == Stats ==
    /// Returns current cache statistics. `entry_count` counts live entries only.
    pub fn stats(&self) -> StatsReport {
        let now = self.clock.now();
        let live = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count();

        StatsReport::new(&self.stats, live, self.current_size_bytes, self.max_size_bytes)
    }

    /// Describes every stored entry, most recently accessed first.
    pub fn entries_info(&self) -> Vec<EntryInfo> {
        let now = self.clock.now();
        let mut info: Vec<EntryInfo> = self
            .lru
            .newest_first()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| EntryInfo::describe(entry, now))
            .collect();
        info.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
        info
    }

    // == Save ==
    /// Writes all entries and statistics to the index file.
    ///
    /// A memory-only store has nowhere to write and returns `Ok(())`.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.index_path.as_deref() else {
            return Ok(());
        };

        let ordered = self.lru.oldest_first().filter_map(|key| self.entries.get(key));
        index::write_index(path, ordered, &self.stats, self.clock.now())?;

        self.dirty = false;
        debug!("Saved {} cache entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    // == Accessors ==
    /// Returns an entry without touching it or the statistics.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_size_bytes(&self) -> u64 {
        self.current_size_bytes
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }

    // == Internal Helpers ==
    fn insert_entry(&mut self, entry: CacheEntry) {
        self.remove_entry(&entry.key);
        self.current_size_bytes = self.current_size_bytes.saturating_add(entry.size_bytes);
        self.lru.touch(&entry.key);
        self.entries.insert(entry.key.clone(), entry);
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.current_size_bytes = self.current_size_bytes.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    fn evict_lru(&mut self) -> bool {
        let Some(key) = self.lru.evict_oldest() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.current_size_bytes = self.current_size_bytes.saturating_sub(entry.size_bytes);
        }
        self.stats.record_eviction();
        debug!("Evicted least recently used cache entry {}", key);
        true
    }
}
