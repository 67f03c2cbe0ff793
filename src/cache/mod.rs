//! Cache Module
//!
//! Provides byte-budgeted caching with TTL expiration, LRU eviction and a
//! persisted JSON index.

mod clock;
mod entry;
pub mod index;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{value_size, CacheEntry, EntryInfo, DEFAULT_ENTRY_SIZE};
pub use lru::LruTracker;
pub use stats::{CacheStats, StatsReport};
pub use store::CacheStore;
