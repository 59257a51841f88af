//! Startup Rehydration Module
//!
//! Restores cache state after a restart: first everything the backing
//! store holds, then the pending durable-buffer records on top. Buffered
//! writes are newer than anything already persisted, so they win.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::info;

use crate::buffer::DurableBuffer;
use crate::cache::CacheStore;
use crate::error::Result;
use crate::persistence::BackingStore;

// == Rehydrate ==
/// Loads persisted and buffered entries back into memory.
///
/// TTL deadlines are stamped fresh from the current policy; the original
/// deadlines do not survive a restart. Entries restored from the buffer
/// keep their `buffered` flag so the next replay cycle persists them.
pub async fn rehydrate(
    cache: &Arc<RwLock<CacheStore>>,
    store: &Arc<dyn BackingStore>,
    buffer: Option<&Arc<Mutex<DurableBuffer>>>,
) -> Result<usize> {
    let persisted = store.load_all().await?;
    let persisted_count = persisted.len();

    let mut cache = cache.write().await;
    for (key, value) in persisted {
        cache.rehydrate_entry(key, value, false)?;
    }

    let mut buffered_count = 0;
    if let Some(buffer) = buffer {
        let pending = buffer.lock().pending(0);
        buffered_count = pending.len();
        for record in pending {
            cache.rehydrate_entry(record.key, record.value, true)?;
        }
    }

    info!(
        "Rehydrated {} persisted and {} buffered entries",
        persisted_count, buffered_count
    );
    Ok(persisted_count + buffered_count)
}
