//! Index Persistence Module
//!
//! Reads and writes the JSON index file that lets a store survive restarts.
//!
//! Layout written:
//! ```json
//! { "entries": [ {entry}, ... ], "stats": {...}, "last_updated": "..." }
//! ```
//! `entries` is ordered least to most recently used. The reader also accepts
//! `entries` as an object keyed by cache key, as older pipeline generations
//! wrote it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

/// File name of the index inside the cache root.
pub const INDEX_FILE_NAME: &str = "cache_index.json";

#[derive(Serialize)]
struct IndexFile<'a> {
    entries: Vec<&'a CacheEntry>,
    stats: &'a CacheStats,
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawIndex {
    #[serde(default)]
    entries: RawEntries,
    #[serde(default)]
    stats: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntries {
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl Default for RawEntries {
    fn default() -> Self {
        RawEntries::List(Vec::new())
    }
}

// == Index Snapshot ==
/// Everything recovered from an index file.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    /// Entries ordered least to most recently used
    pub entries: Vec<CacheEntry>,
    pub stats: CacheStats,
    /// Entries that failed to deserialize and were skipped
    pub rejected: usize,
}

// == Read ==
/// Reads the index at `path`.
///
/// Returns `Ok(None)` when no index exists yet. An empty or unparseable file
/// is reported as [`CacheError::CorruptIndex`]; individual bad entries are
/// skipped and counted in [`IndexSnapshot::rejected`].
pub fn read_index(path: &Path) -> Result<Option<IndexSnapshot>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(CacheError::io(path, err)),
    };

    if text.trim().is_empty() {
        return Err(CacheError::CorruptIndex {
            path: path.to_path_buf(),
            reason: "index file is empty".to_string(),
        });
    }

    let raw: RawIndex = serde_json::from_str(&text).map_err(|err| CacheError::CorruptIndex {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let mut snapshot = IndexSnapshot::default();

    match raw.entries {
        RawEntries::List(items) => {
            for item in items {
                match serde_json::from_value::<CacheEntry>(item) {
                    Ok(entry) => snapshot.entries.push(entry),
                    Err(err) => {
                        warn!("Skipping unreadable cache entry: {}", err);
                        snapshot.rejected += 1;
                    }
                }
            }
        }
        RawEntries::Map(items) => {
            for (key, item) in items {
                match serde_json::from_value::<CacheEntry>(item) {
                    Ok(mut entry) => {
                        entry.key = key;
                        snapshot.entries.push(entry);
                    }
                    Err(err) => {
                        warn!("Skipping unreadable cache entry {}: {}", key, err);
                        snapshot.rejected += 1;
                    }
                }
            }
            // Object order carries no recency; rebuild it from access times.
            snapshot.entries.sort_by_key(|entry| entry.last_accessed_at);
        }
    }

    if let Some(stats) = raw.stats {
        match serde_json::from_value(stats) {
            Ok(stats) => snapshot.stats = stats,
            Err(err) => warn!("Ignoring unreadable cache statistics: {}", err),
        }
    }

    Ok(Some(snapshot))
}

// == Write ==
/// Writes the index to `path`, replacing any previous file atomically.
///
/// `entries` must be ordered least to most recently used.
pub fn write_index<'a, I>(
    path: &Path,
    entries: I,
    stats: &CacheStats,
    now: DateTime<Utc>,
) -> Result<()>
where
    I: IntoIterator<Item = &'a CacheEntry>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| CacheError::io(parent, err))?;
    }

    let index = IndexFile {
        entries: entries.into_iter().collect(),
        stats,
        last_updated: now,
    };
    let json = serde_json::to_string_pretty(&index)?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json.as_bytes()).map_err(|err| CacheError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| CacheError::io(path, err))?;

    Ok(())
}
