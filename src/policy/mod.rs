//! Policy Module
//!
//! TTL policies per operation, deterministic key derivation and the
//! cache-aside manager built on top of them.

pub mod key;
mod manager;
mod table;

pub use key::{canonical_json, derive_key, operation_prefix, KEY_LEN};
pub use manager::{CacheManager, CleanupReport};
pub use table::{PolicyTable, TtlPolicy, DEFAULT_OPERATION};
