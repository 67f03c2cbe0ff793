//! Frame Handlers
//!
//! One handler per frame action. Handlers never fail outright; problems come
//! back as [`FrameOutcome::Failed`].

use crate::models::{FrameOutcome, FrameRequest};
use crate::policy::CacheManager;

/// Entries listed in an overview report.
pub const OVERVIEW_ENTRY_LIMIT: usize = 10;

/// Looks up the cached result for the targeted operation.
pub async fn get_handler(manager: &CacheManager, req: &FrameRequest) -> FrameOutcome {
    let params = &req.parameters;
    let cached_data: Option<serde_json::Value> = manager
        .get_cached_result(params.target_operation(), &params.params)
        .await;

    FrameOutcome::Lookup {
        cached_data_found: cached_data.is_some(),
        cached_data,
    }
}

/// Caches `data` as the result of the targeted operation.
pub async fn set_handler(manager: &CacheManager, req: &FrameRequest) -> FrameOutcome {
    let Some(data) = req.data.as_ref() else {
        return FrameOutcome::failed("set requires a data field");
    };

    let params = &req.parameters;
    let operation = params.target_operation();

    let cache_key = match manager.key_for(operation, &params.params) {
        Ok(key) => key,
        Err(err) => return FrameOutcome::failed(err.to_string()),
    };

    match manager.cache_result(operation, &params.params, data).await {
        Ok(()) => FrameOutcome::Stored {
            data_cached: true,
            cache_key,
        },
        Err(err) => FrameOutcome::failed(err.to_string()),
    }
}

/// Removes expired entries.
pub async fn cleanup_handler(manager: &CacheManager) -> FrameOutcome {
    FrameOutcome::Cleanup {
        cleanup_complete: true,
        cleanup_stats: manager.cleanup().await,
    }
}

/// Drops every cached result of the targeted operation.
pub async fn invalidate_handler(manager: &CacheManager, req: &FrameRequest) -> FrameOutcome {
    let Some(operation) = req.parameters.operation.as_deref() else {
        return FrameOutcome::failed("invalidate requires parameters.operation");
    };

    FrameOutcome::Invalidated {
        invalidation_complete: true,
        invalidated_entries: manager.invalidate_operation(operation).await,
    }
}

/// Lists the most recently used entries.
pub async fn overview_handler(manager: &CacheManager) -> FrameOutcome {
    let mut cache_info = manager.entries_info().await;
    let total_entries = cache_info.len();
    cache_info.truncate(OVERVIEW_ENTRY_LIMIT);

    FrameOutcome::Overview {
        cache_info,
        total_entries,
    }
}
