//! Maintenance Task
//!
//! Background task that periodically removes expired entries and writes the
//! index back to disk. Together with [`CacheManager::close`] this is the
//! cache's flush policy: durability is "as of the last flush".

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::policy::CacheManager;

/// Spawns a background task that cleans up and flushes `manager` every
/// `interval_secs` seconds.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown. Aborting skips the final flush; call
/// [`CacheManager::close`] afterwards.
///
/// # Example
/// ```ignore
/// let manager = CacheManager::open(&config);
/// let handle = manager.start_maintenance(&config);
/// // Later, during shutdown:
/// handle.abort();
/// manager.close().await;
/// ```
pub fn spawn_maintenance_task(manager: CacheManager, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = manager.cleanup().await;
            if report.expired_removed > 0 {
                info!(
                    "Cache maintenance: removed {} expired entries, {} remain",
                    report.expired_removed, report.current_entries
                );
            } else {
                debug!("Cache maintenance: no expired entries found");
            }

            match manager.flush().await {
                Ok(true) => debug!("Cache maintenance: index flushed"),
                Ok(false) => {}
                Err(err) => warn!("Cache maintenance: could not flush index: {}", err),
            }
        }
    })
}
