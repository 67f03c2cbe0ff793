//! Frame Module
//!
//! Single entry point through which a pipeline stage drives the cache with a
//! request document instead of calling [`CacheManager`] directly.
//!
//! # Actions
//! - `get` - Look up the cached result of `parameters.operation` / `parameters.params`
//! - `set` - Cache `data` as that result
//! - `cleanup` - Remove expired entries
//! - `invalidate` - Drop every result of `parameters.operation`
//! - anything else - Statistics plus the ten most recently used entries

pub mod handlers;

use tracing::{info, warn};

use crate::models::{FrameAction, FrameReport, FrameRequest};
use crate::policy::CacheManager;
use handlers::{
    cleanup_handler, get_handler, invalidate_handler, overview_handler, set_handler,
};

/// Runs one frame request against `manager`.
///
/// Every report carries the statistics as they stand after the action.
pub async fn run_frame(manager: &CacheManager, request: FrameRequest) -> FrameReport {
    let action = request.action();
    info!("Running cache frame: {:?}", action);

    let outcome = match action {
        FrameAction::Get => get_handler(manager, &request).await,
        FrameAction::Set => set_handler(manager, &request).await,
        FrameAction::Cleanup => cleanup_handler(manager).await,
        FrameAction::Invalidate => invalidate_handler(manager, &request).await,
        FrameAction::Overview => overview_handler(manager).await,
    };

    let report = FrameReport::new(outcome, manager.stats().await);
    if report.success {
        let stats = &report.cache_stats;
        info!(
            "Cache: {} entries, {:.1}MB / {:.1}MB, hit rate {:.1}%",
            stats.entry_count,
            stats.current_size_mb(),
            stats.max_size_mb(),
            stats.hit_rate * 100.0
        );
    } else {
        warn!("Cache frame {:?} failed", action);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::models::FrameOutcome;
    use crate::policy::PolicyTable;
    use serde_json::json;

    fn manager() -> CacheManager {
        CacheManager::new(CacheStore::new(1 << 20), PolicyTable::default())
    }

    fn request(doc: serde_json::Value) -> FrameRequest {
        serde_json::from_value(doc).unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let manager = manager();
        let target = json!({"operation": "file_analysis", "params": {"root": "/repo"}});

        let stored = run_frame(
            &manager,
            request(json!({"operation": "set", "parameters": target, "data": {"files": 2}})),
        )
        .await;
        assert!(stored.success);
        let FrameOutcome::Stored { cache_key, .. } = &stored.outcome else {
            panic!("expected a stored outcome, got {:?}", stored.outcome);
        };
        assert_eq!(
            cache_key,
            &manager
                .key_for("file_analysis", &json!({"root": "/repo"}))
                .unwrap()
        );

        let fetched = run_frame(
            &manager,
            request(json!({"operation": "get", "parameters": target})),
        )
        .await;
        match fetched.outcome {
            FrameOutcome::Lookup {
                cached_data_found,
                cached_data,
            } => {
                assert!(cached_data_found);
                assert_eq!(cached_data, Some(json!({"files": 2})));
            }
            other => panic!("expected a lookup outcome, got {:?}", other),
        }
        assert_eq!(fetched.cache_stats.hits, 1);
    }

    #[tokio::test]
    async fn test_get_miss() {
        let report = run_frame(&manager(), request(json!({"operation": "get"}))).await;
        assert!(report.success);
        assert!(matches!(
            report.outcome,
            FrameOutcome::Lookup {
                cached_data_found: false,
                cached_data: None
            }
        ));
        assert_eq!(report.cache_stats.misses, 1);
    }

    #[tokio::test]
    async fn test_set_without_data_fails() {
        let report = run_frame(&manager(), request(json!({"operation": "set"}))).await;
        assert!(!report.success);
        assert!(report.outcome.is_failure());
    }

    #[tokio::test]
    async fn test_invalidate_requires_operation() {
        let report = run_frame(&manager(), request(json!({"operation": "invalidate"}))).await;
        assert!(!report.success);
    }

    #[tokio::test]
    async fn test_invalidate_operation() {
        let manager = manager();
        for root in ["/a", "/b"] {
            manager
                .cache_result("file_analysis", &json!({"root": root}), &1)
                .await
                .unwrap();
        }

        let report = run_frame(
            &manager,
            request(json!({"operation": "invalidate", "parameters": {"operation": "file_analysis"}})),
        )
        .await;
        assert!(matches!(
            report.outcome,
            FrameOutcome::Invalidated {
                invalidated_entries: 2,
                ..
            }
        ));
        assert_eq!(report.cache_stats.entry_count, 0);
    }

    #[tokio::test]
    async fn test_cleanup() {
        let report = run_frame(&manager(), request(json!({"operation": "cleanup"}))).await;
        assert!(matches!(
            report.outcome,
            FrameOutcome::Cleanup {
                cleanup_complete: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_overview_lists_at_most_ten_entries() {
        let manager = manager();
        for i in 0..12 {
            manager.cache_result("scan", &json!({"i": i}), &i).await.unwrap();
        }

        let report = run_frame(&manager, FrameRequest::default()).await;
        match report.outcome {
            FrameOutcome::Overview {
                cache_info,
                total_entries,
            } => {
                assert_eq!(total_entries, 12);
                assert_eq!(cache_info.len(), 10);
            }
            other => panic!("expected an overview outcome, got {:?}", other),
        }
    }
}
