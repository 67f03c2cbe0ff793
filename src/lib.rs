//! Memo Cache - A persistent memoization cache for pipeline operations
//!
//! Results are keyed by operation name and parameters, expire per operation
//! TTL policy, and are evicted least-recently-used first under a byte budget.

pub mod cache;
pub mod config;
pub mod error;
pub mod frame;
pub mod models;
pub mod policy;
pub mod tasks;

pub use cache::CacheStore;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use frame::run_frame;
pub use policy::{CacheManager, PolicyTable};
pub use tasks::spawn_maintenance_task;
