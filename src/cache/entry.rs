//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Size charged for a value whose JSON rendering fails.
pub const DEFAULT_ENTRY_SIZE: u64 = 1024;

/// Largest TTL chrono can represent; longer TTLs are clamped to it.
const MAX_TTL_SECS: i64 = i64::MAX / 1000;

// == Cache Entry ==
/// Represents a single cache entry with value and bookkeeping.
///
/// Field aliases accept index files written by the older generation of the
/// pipeline (`data`, `last_accessed`, `ttl`, `size`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Fingerprint this entry is stored under
    pub key: String,
    /// The stored value
    #[serde(alias = "data")]
    pub value: Value,
    /// Insertion time
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last successful read (or insertion time if never read)
    #[serde(alias = "last_accessed", deserialize_with = "deserialize_timestamp")]
    pub last_accessed_at: DateTime<Utc>,
    /// Number of successful reads
    #[serde(default)]
    pub access_count: u64,
    /// Lifetime in seconds, measured from `created_at`
    #[serde(alias = "ttl")]
    pub ttl_seconds: u64,
    /// Approximate footprint of `value`, fixed at construction
    #[serde(alias = "size")]
    pub size_bytes: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped at `now`.
    pub fn new(key: String, value: Value, ttl_seconds: u64, now: DateTime<Utc>) -> Self {
        let size_bytes = value_size(&value);

        Self {
            key,
            value,
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
            ttl_seconds,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// Boundary condition: an entry is live at exactly `created_at + ttl` and
    /// expired strictly after it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > self.ttl()
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed_at = now;
    }

    /// Instant after which the entry counts as expired.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at
            .checked_add_signed(self.ttl())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Remaining lifetime in whole seconds, 0 once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at() - now).num_seconds().max(0) as u64
    }

    fn ttl(&self) -> Duration {
        let secs = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(MAX_TTL_SECS))
    }
}

// == Entry Info ==
/// Bookkeeping view of an entry, without its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub size_bytes: u64,
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub is_expired: bool,
}

impl EntryInfo {
    pub fn describe(entry: &CacheEntry, now: DateTime<Utc>) -> Self {
        Self {
            key: entry.key.clone(),
            size_bytes: entry.size_bytes,
            access_count: entry.access_count,
            created_at: entry.created_at,
            last_accessed_at: entry.last_accessed_at,
            ttl_seconds: entry.ttl_seconds,
            is_expired: entry.is_expired(now),
        }
    }
}

// == Utility Functions ==
/// Approximate serialized footprint of a value.
///
/// Strings are charged their UTF-8 length; anything else the length of its
/// compact JSON rendering.
pub fn value_size(value: &Value) -> u64 {
    match value {
        Value::String(s) => s.len() as u64,
        other => serde_json::to_string(other)
            .map(|rendered| rendered.len() as u64)
            .unwrap_or(DEFAULT_ENTRY_SIZE),
    }
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 ones (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}
