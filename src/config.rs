//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};
use crate::policy::PolicyTable;

/// Prefix for per-operation TTL overrides, e.g. `CACHE_TTL_FILE_ANALYSIS=600`.
const TTL_OVERRIDE_PREFIX: &str = "CACHE_TTL_";

/// Default byte budget (100 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the persisted index
    pub cache_root: PathBuf,
    /// Total byte budget across all entries
    pub max_size_bytes: u64,
    /// Operation name to TTL mapping
    pub policies: PolicyTable,
    /// Interval in seconds between background cleanup + flush runs, used by
    /// [`CacheManager::start_maintenance`](crate::CacheManager::start_maintenance)
    pub maintenance_interval_secs: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ROOT` - Index directory (default: `intelligent_cache`)
    /// - `CACHE_MAX_SIZE_BYTES` - Byte budget (default: 100 MiB)
    /// - `CACHE_MAINTENANCE_INTERVAL` - Cleanup/flush frequency in seconds (default: 300)
    /// - `CACHE_TTL_<OPERATION>` - TTL override in seconds for one operation
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Same as [`CacheConfig::from_env`] but reads from the given pairs.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();

        for (name, value) in vars {
            match name.as_str() {
                "CACHE_ROOT" if !value.is_empty() => config.cache_root = PathBuf::from(value),
                "CACHE_MAX_SIZE_BYTES" => {
                    if let Ok(bytes) = value.parse() {
                        config.max_size_bytes = bytes;
                    }
                }
                "CACHE_MAINTENANCE_INTERVAL" => {
                    if let Ok(secs) = value.parse() {
                        config.maintenance_interval_secs = secs;
                    }
                }
                _ => {
                    let Some(operation) = name.strip_prefix(TTL_OVERRIDE_PREFIX) else {
                        continue;
                    };
                    if let Ok(ttl) = value.parse() {
                        config.policies.set(operation.to_lowercase(), ttl);
                    }
                }
            }
        }

        config
    }

    /// Uses `root` as the index directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Overrides the byte budget.
    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_size_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.maintenance_interval_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "maintenance interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("intelligent_cache"),
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            policies: PolicyTable::default(),
            maintenance_interval_secs: 300,
        }
    }
}
