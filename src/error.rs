//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// Everything except [`CacheError::InvalidConfig`] is recoverable: callers
/// degrade to a cache miss and recompute.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value or parameter bag could not be encoded or decoded as JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing the index file failed
    #[error("Index I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index file exists but could not be parsed
    #[error("Index at {} is corrupt: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    /// Configuration rejected at startup
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Returns true when the fault should degrade to "treat as a miss".
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CacheError::InvalidConfig(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
