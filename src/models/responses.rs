//! Response DTOs for the cache frame
//!
//! Defines the report document produced by one frame run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{EntryInfo, StatsReport};
use crate::policy::CleanupReport;

/// Report for one frame run.
///
/// Action-specific fields are flattened next to the common ones.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: FrameOutcome,
    pub cache_stats: StatsReport,
    pub timestamp: DateTime<Utc>,
}

/// Action-specific part of a [`FrameReport`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FrameOutcome {
    Lookup {
        cached_data_found: bool,
        cached_data: Option<Value>,
    },
    Stored {
        data_cached: bool,
        cache_key: String,
    },
    Cleanup {
        cleanup_complete: bool,
        cleanup_stats: CleanupReport,
    },
    Invalidated {
        invalidation_complete: bool,
        invalidated_entries: usize,
    },
    Overview {
        cache_info: Vec<EntryInfo>,
        total_entries: usize,
    },
    Failed {
        error: String,
    },
}

impl FrameOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        FrameOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FrameOutcome::Failed { .. })
    }
}

impl FrameReport {
    pub fn new(outcome: FrameOutcome, cache_stats: StatsReport) -> Self {
        Self {
            success: !outcome.is_failure(),
            outcome,
            cache_stats,
            timestamp: Utc::now(),
        }
    }
}
