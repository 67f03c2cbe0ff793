//! Cache Manager
//!
//! Cache-aside front end over a shared [`CacheStore`]: derives keys from
//! `(operation, parameters)`, picks TTLs from the policy table and turns every
//! internal fault into a miss.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, Clock, EntryInfo, StatsReport, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::policy::key::{derive_key, operation_prefix};
use crate::policy::PolicyTable;
use crate::tasks::spawn_maintenance_task;

// == Cleanup Report ==
/// Outcome of a [`CacheManager::cleanup`] pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub expired_removed: usize,
    pub current_entries: usize,
    pub current_size_bytes: u64,
}

// == Cache Manager ==
/// Shared handle to a policy-driven cache.
///
/// Cloning is cheap; all clones use the same store. Every store access,
/// reads included, takes the write lock because a hit reorders the LRU list.
/// Compute closures always run with the lock released.
#[derive(Debug, Clone)]
pub struct CacheManager {
    store: Arc<RwLock<CacheStore>>,
    policies: Arc<PolicyTable>,
}

impl CacheManager {
    /// Wraps an existing store.
    pub fn new(store: CacheStore, policies: PolicyTable) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            policies: Arc::new(policies),
        }
    }

    /// Opens the store persisted under `config.cache_root`.
    pub fn open(config: &CacheConfig) -> Self {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let store = CacheStore::open(&config.cache_root, config.max_size_bytes, clock);
        info!(
            "Cache opened at {} with a {} byte budget",
            config.cache_root.display(),
            config.max_size_bytes
        );
        Self::new(store, config.policies.clone())
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// The shared store, for maintenance tasks.
    pub fn store(&self) -> &Arc<RwLock<CacheStore>> {
        &self.store
    }

    /// Key under which `operation` with `params` is stored.
    pub fn key_for<P>(&self, operation: &str, params: &P) -> Result<String>
    where
        P: Serialize + ?Sized,
    {
        derive_key(operation, params)
    }

    // == Get Cached Result ==
    /// Looks up a cached result.
    ///
    /// Returns `None` on a miss, and also when the parameters cannot be
    /// encoded or the cached value does not decode as `T`.
    pub async fn get_cached_result<T, P>(&self, operation: &str, params: &P) -> Option<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let key = match derive_key(operation, params) {
            Ok(key) => key,
            Err(err) => {
                warn!("Cannot derive cache key for {}: {}", operation, err);
                return None;
            }
        };

        let value = self.store.write().await.get(&key)?;

        match serde_json::from_value(value) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(
                    "Cached {} result has an unexpected shape, treating as miss: {}",
                    operation, err
                );
                self.store.write().await.record_decode_miss();
                None
            }
        }
    }

    // == Cache Result ==
    /// Stores `value` as the result of `operation` with `params`, using the
    /// operation's TTL policy.
    pub async fn cache_result<T, P>(&self, operation: &str, params: &P, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        let key = derive_key(operation, params)?;
        let value = serde_json::to_value(value)?;
        let ttl = self.policies.ttl_for(operation);

        let evicted = self.store.write().await.set(key, value, ttl);
        if evicted > 0 {
            debug!("Caching {} result evicted {} entries", operation, evicted);
        }
        Ok(())
    }

    // == Get Or Compute ==
    /// Returns the cached result, or runs `compute` once and caches its output.
    ///
    /// Concurrent callers missing on the same key may each run `compute`; the
    /// last write wins. A failure to cache the result is logged and the
    /// computed value is still returned.
    pub async fn get_or_compute<T, P, F, Fut>(&self, operation: &str, params: &P, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(hit) = self.get_cached_result(operation, params).await {
            debug!("Cache hit for {}", operation);
            return hit;
        }

        let result = compute().await;
        if let Err(err) = self.cache_result(operation, params, &result).await {
            warn!("Could not cache {} result: {}", operation, err);
        }
        result
    }

    /// Like [`CacheManager::get_or_compute`] for fallible computations.
    ///
    /// Errors are returned to the caller and never cached.
    pub async fn try_get_or_compute<T, E, P, F, Fut>(
        &self,
        operation: &str,
        params: &P,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(hit) = self.get_cached_result(operation, params).await {
            return Ok(hit);
        }

        let result = compute().await?;
        if let Err(err) = self.cache_result(operation, params, &result).await {
            warn!("Could not cache {} result: {}", operation, err);
        }
        Ok(result)
    }

    // == Invalidation ==
    /// Drops every cached result of `operation`, whatever its parameters.
    pub async fn invalidate_operation(&self, operation: &str) -> usize {
        let prefix = operation_prefix(operation);
        let removed = self
            .store
            .write()
            .await
            .invalidate_matching(|key| key.starts_with(&prefix));
        info!("Invalidated {} cached {} results", removed, operation);
        removed
    }

    /// Drops the cached result of one `(operation, params)` call.
    pub async fn invalidate_entry<P>(&self, operation: &str, params: &P) -> bool
    where
        P: Serialize + ?Sized,
    {
        match derive_key(operation, params) {
            Ok(key) => self.store.write().await.remove(&key),
            Err(err) => {
                warn!("Cannot derive cache key for {}: {}", operation, err);
                false
            }
        }
    }

    /// Drops everything.
    pub async fn invalidate_all(&self) -> usize {
        let removed = self.store.write().await.invalidate_all();
        info!("Invalidated all {} cached results", removed);
        removed
    }

    // == Maintenance ==
    /// Removes expired entries and reports what is left.
    pub async fn cleanup(&self) -> CleanupReport {
        let mut store = self.store.write().await;
        let expired_removed = store.cleanup_expired();

        CleanupReport {
            expired_removed,
            current_entries: store.len(),
            current_size_bytes: store.current_size_bytes(),
        }
    }

    pub async fn stats(&self) -> StatsReport {
        self.store.read().await.stats()
    }

    pub async fn entries_info(&self) -> Vec<EntryInfo> {
        self.store.read().await.entries_info()
    }

    /// Saves the index if anything changed since the last save.
    ///
    /// Returns whether a write happened.
    pub async fn flush(&self) -> Result<bool> {
        let mut store = self.store.write().await;
        if !store.is_dirty() {
            return Ok(false);
        }
        store.save()?;
        Ok(true)
    }

    /// Starts the background cleanup + flush loop every
    /// `config.maintenance_interval_secs` seconds.
    pub fn start_maintenance(&self, config: &CacheConfig) -> JoinHandle<()> {
        spawn_maintenance_task(self.clone(), config.maintenance_interval_secs)
    }

    /// Final flush at shutdown. Failures are logged, never returned.
    pub async fn close(self) {
        match self.flush().await {
            Ok(true) => info!("Cache index saved on close"),
            Ok(false) => debug!("Cache index already up to date"),
            Err(err) => warn!("Could not save cache index on close: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::policy::TtlPolicy;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ScanResult {
        files: Vec<String>,
        total_lines: u64,
    }

    fn scan_result() -> ScanResult {
        ScanResult {
            files: vec!["src/lib.rs".to_string(), "src/main.rs".to_string()],
            total_lines: 420,
        }
    }

    fn manager_with_clock(max: u64) -> (CacheManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = CacheStore::with_clock(max, clock.clone());
        (CacheManager::new(store, PolicyTable::default()), clock)
    }

    #[tokio::test]
    async fn test_cache_result_then_get() {
        let (manager, _) = manager_with_clock(1 << 20);
        let params = json!({"root": "/repo", "depth": 3});

        manager
            .cache_result("file_analysis", &params, &scan_result())
            .await
            .unwrap();
        let cached: Option<ScanResult> = manager.get_cached_result("file_analysis", &params).await;

        assert_eq!(cached, Some(scan_result()));
    }

    #[tokio::test]
    async fn test_miss_for_other_parameters() {
        let (manager, _) = manager_with_clock(1 << 20);
        manager
            .cache_result("file_analysis", &json!({"root": "/a"}), &1u32)
            .await
            .unwrap();

        let cached: Option<u32> = manager
            .get_cached_result("file_analysis", &json!({"root": "/b"}))
            .await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_ttl_follows_operation_policy() {
        let (manager, clock) = manager_with_clock(1 << 20);
        let params = json!({"pkg": "serde"});

        manager.cache_result("dependency_scan", &params, "deps").await.unwrap();
        manager.cache_result("unlisted_op", &params, "other").await.unwrap();

        clock.advance_secs(1801);
        let other: Option<String> = manager.get_cached_result("unlisted_op", &params).await;
        let deps: Option<String> = manager.get_cached_result("dependency_scan", &params).await;

        assert!(other.is_none(), "default policy is 1800s");
        assert_eq!(deps.as_deref(), Some("deps"));
    }

    #[tokio::test]
    async fn test_get_or_compute_runs_once() {
        let (manager, _) = manager_with_clock(1 << 20);
        let calls = AtomicUsize::new(0);
        let params = json!({"pattern": "TODO"});

        let first = manager
            .get_or_compute("pattern_analysis", &params, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![1u32, 2, 3]
            })
            .await;
        let second = manager
            .get_or_compute("pattern_analysis", &params, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![9u32]
            })
            .await;

        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_returns_value_even_if_evicted() {
        // Budget smaller than the value: admitted alone, still returned.
        let (manager, _) = manager_with_clock(4);
        let value = manager
            .get_or_compute("meta_analysis", &json!({}), || async { "a long result".to_string() })
            .await;
        assert_eq!(value, "a long result");
    }

    #[tokio::test]
    async fn test_try_get_or_compute_does_not_cache_errors() {
        let (manager, _) = manager_with_clock(1 << 20);
        let params = json!({"id": 1});

        let failed: std::result::Result<u32, String> = manager
            .try_get_or_compute("knowledge_hub", &params, || async { Err("offline".to_string()) })
            .await;
        assert_eq!(failed, Err("offline".to_string()));
        assert_eq!(manager.stats().await.entry_count, 0);

        let ok: std::result::Result<u32, String> = manager
            .try_get_or_compute("knowledge_hub", &params, || async { Ok(7) })
            .await;
        assert_eq!(ok, Ok(7));

        let cached: std::result::Result<u32, String> = manager
            .try_get_or_compute("knowledge_hub", &params, || async { Ok(8) })
            .await;
        assert_eq!(cached, Ok(7));
    }

    #[tokio::test]
    async fn test_decode_mismatch_is_a_miss() {
        let (manager, _) = manager_with_clock(1 << 20);
        let params = json!({"x": 1});
        manager.cache_result("file_analysis", &params, "text").await.unwrap();

        let wrong: Option<ScanResult> = manager.get_cached_result("file_analysis", &params).await;
        assert!(wrong.is_none());

        let stats = manager.stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.hit_rate, 0.0);

        let right: Option<String> = manager.get_cached_result("file_analysis", &params).await;
        assert_eq!(right.as_deref(), Some("text"));
        assert_eq!(manager.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_compute_runs_with_store_unlocked() {
        let (manager, _) = manager_with_clock(1 << 20);
        let params = json!({"root": "/repo"});

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            manager.get_or_compute("file_analysis", &params, || async {
                // Both calls need the store lock.
                let before = manager.stats().await;
                manager
                    .cache_result("dependency_scan", &params, &1)
                    .await
                    .unwrap();
                before.misses
            }),
        )
        .await
        .expect("compute should not wait on the store lock");

        assert_eq!(result, 1);
        assert_eq!(manager.stats().await.entry_count, 2);

        let fallible = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            manager.try_get_or_compute("pattern_analysis", &params, || async {
                manager.invalidate_operation("dependency_scan").await;
                Ok::<_, String>(manager.stats().await.entry_count)
            }),
        )
        .await
        .expect("fallible compute should not wait on the store lock");
        assert_eq!(fallible, Ok(1));
    }

    #[tokio::test]
    async fn test_invalidate_operation_leaves_other_operations() {
        let (manager, _) = manager_with_clock(1 << 20);
        for i in 0..3 {
            manager.cache_result("file_analysis", &json!({"i": i}), &i).await.unwrap();
        }
        manager.cache_result("dependency_scan", &json!({"i": 0}), &0).await.unwrap();

        assert_eq!(manager.invalidate_operation("file_analysis").await, 3);
        assert_eq!(manager.invalidate_operation("file_analysis").await, 0);

        let remaining: Option<i32> = manager
            .get_cached_result("dependency_scan", &json!({"i": 0}))
            .await;
        assert_eq!(remaining, Some(0));
    }

    #[tokio::test]
    async fn test_invalidate_entry_and_all() {
        let (manager, _) = manager_with_clock(1 << 20);
        manager.cache_result("file_analysis", &json!({"i": 1}), &1).await.unwrap();
        manager.cache_result("file_analysis", &json!({"i": 2}), &2).await.unwrap();

        assert!(manager.invalidate_entry("file_analysis", &json!({"i": 1})).await);
        assert!(!manager.invalidate_entry("file_analysis", &json!({"i": 1})).await);
        assert_eq!(manager.invalidate_all().await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_reports_remaining() {
        let policies = PolicyTable::new(TtlPolicy::secs(10)).with_policy("long", 1000);
        let clock = Arc::new(ManualClock::default());
        let manager = CacheManager::new(CacheStore::with_clock(1 << 20, clock.clone()), policies);

        manager.cache_result("short", &json!({}), "abc").await.unwrap();
        manager.cache_result("long", &json!({}), "defg").await.unwrap();
        clock.advance_secs(11);

        let report = manager.cleanup().await;
        assert_eq!(
            report,
            CleanupReport {
                expired_removed: 1,
                current_entries: 1,
                current_size_bytes: 4,
            }
        );
    }

    #[tokio::test]
    async fn test_flush_only_when_dirty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = CacheConfig::default().with_root(tmp.path());
        let manager = CacheManager::open(&config);

        assert!(!manager.flush().await.unwrap());
        manager.cache_result("file_analysis", &json!({}), &1).await.unwrap();
        assert!(manager.flush().await.unwrap());
        assert!(!manager.flush().await.unwrap());
        assert!(tmp.path().join(crate::cache::index::INDEX_FILE_NAME).exists());
    }
}
