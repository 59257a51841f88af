//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries. Lazy
//! expiry on reads already keeps results correct; the sweep reclaims
//! memory for entries nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for the configured interval between runs and acquires
/// the cache write lock only for the sweep itself. The returned handle can
/// be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(cache.clone(), config.sweep_interval);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(
    cache: Arc<RwLock<CacheStore>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting TTL sweep task with interval {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.sweep_expired()
            };

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
