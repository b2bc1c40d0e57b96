//! Retention Sweep Task
//!
//! Background task that periodically drops entries nobody can still treat
//! as fresh, bounding memory for caches that see many distinct keys.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, Clock};

/// Spawns a task that sweeps `cache` every `interval`, removing entries older
/// than `retention`.
///
/// `retention` should be at least the longest TTL callers use; a swept entry
/// only costs one extra producer run. The returned handle aborts the task.
///
/// # Example
/// ```ignore
/// let executor: Executor<String> = Executor::new(Config::default());
/// let sweep = executor.spawn_cleanup();
/// // during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task<T>(
    cache: Arc<RwLock<CacheStore<T>>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    retention: Duration,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting retention sweep every {:?}, retention {:?}",
            interval, retention
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let now = clock.now_ms();
                let mut cache_guard = cache.write().await;
                cache_guard.purge_older_than(retention, now)
            };

            if removed > 0 {
                info!("Retention sweep: removed {} stale entries", removed);
            } else {
                debug!("Retention sweep: nothing to remove");
            }
        }
    })
}
