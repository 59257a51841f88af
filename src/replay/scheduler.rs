//! Replay Scheduler Module
//!
//! Drains the durable buffer into the backing store, one cycle per tick.
//! The scheduler owns no timer: the composition root invokes
//! [`ReplayScheduler::run_replay_cycle`] on the configured interval (see
//! `tasks::spawn_replay_task`).

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::buffer::DurableBuffer;
use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::persistence::BackingStore;

// == Replay Cursor ==
/// Position of the last sequence successfully replayed into the backing
/// store. Reset only by explicit buffer truncation; acked records are
/// removed from the log, so after a restart resuming from zero re-covers
/// exactly the un-acked records (at-least-once).
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayCursor {
    /// Highest sequence persisted and acknowledged
    pub last_replayed: u64,
}

// == Replay Outcome ==
/// Result of one replay cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOutcome {
    /// Number of records persisted this cycle
    pub persisted: usize,
    /// True if the tick was skipped because a cycle was still draining
    pub skipped: bool,
}

// == Replay Scheduler ==
/// Periodically drains the durable buffer into the backing store.
///
/// State machine per tick: Idle -> Draining -> Idle. A tick arriving while
/// a cycle is still draining is skipped, never queued, so at most one
/// drain is in flight.
pub struct ReplayScheduler {
    cache: Arc<RwLock<CacheStore>>,
    buffer: Arc<Mutex<DurableBuffer>>,
    store: Arc<dyn BackingStore>,
    cursor: Mutex<ReplayCursor>,
    /// Held for the duration of a drain; `try_lock` is the overlap guard
    draining: tokio::sync::Mutex<()>,
}

impl ReplayScheduler {
    /// Creates a scheduler over the given cache, buffer and store port.
    pub fn new(
        cache: Arc<RwLock<CacheStore>>,
        buffer: Arc<Mutex<DurableBuffer>>,
        store: Arc<dyn BackingStore>,
    ) -> Self {
        Self {
            cache,
            buffer,
            store,
            cursor: Mutex::new(ReplayCursor::default()),
            draining: tokio::sync::Mutex::new(()),
        }
    }

    // == Run Replay Cycle ==
    /// Runs one drain cycle.
    ///
    /// Reads the pending records past the cursor, persists them in
    /// sequence order, acknowledges the persisted prefix and advances the
    /// cursor. On a persistence failure the cycle halts at the failed
    /// record: the prefix before it is still acknowledged, the rest stays
    /// pending, and the next tick retries from the failure point. No
    /// record is ever dropped.
    ///
    /// The cache lock is only taken once, briefly, after acknowledgement,
    /// to clear `buffered` flags; persisting never contends with get/put.
    pub async fn run_replay_cycle(&self) -> Result<ReplayOutcome> {
        let _guard = match self.draining.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Replay tick skipped: previous cycle still draining");
                return Ok(ReplayOutcome {
                    persisted: 0,
                    skipped: true,
                });
            }
        };

        let since = self.cursor.lock().last_replayed;
        let pending = self.buffer.lock().pending(since);
        if pending.is_empty() {
            return Ok(ReplayOutcome {
                persisted: 0,
                skipped: false,
            });
        }

        let mut persisted_keys = Vec::new();
        let mut highest = since;
        let mut failure = None;

        for record in &pending {
            match self.store.persist(&record.key, &record.value).await {
                Ok(()) => {
                    highest = record.sequence;
                    persisted_keys.push(record.key.clone());
                }
                Err(e) => {
                    warn!(
                        "Replay halted at sequence {}: {}; retrying next tick",
                        record.sequence, e
                    );
                    failure = Some(CacheError::ReplayPersist(format!(
                        "sequence {}: {}",
                        record.sequence, e
                    )));
                    break;
                }
            }
        }

        if highest > since {
            let still_pending = {
                let mut buffer = self.buffer.lock();
                buffer.ack(highest)?;
                buffer.pending_keys()
            };
            self.cursor.lock().last_replayed = highest;

            // A key that picked up a new write since the pending() snapshot
            // must stay flagged as buffered.
            persisted_keys.retain(|key| !still_pending.contains(key));
            let mut cache = self.cache.write().await;
            cache.mark_persisted(persisted_keys.iter().map(String::as_str));
        }

        match failure {
            Some(e) => Err(e),
            None => {
                debug!("Replay cycle persisted {} records", pending.len());
                Ok(ReplayOutcome {
                    persisted: pending.len(),
                    skipped: false,
                })
            }
        }
    }

    // == Drain ==
    /// Runs replay cycles until the buffer is empty.
    ///
    /// Used at shutdown when `drain_on_shutdown` is set. Stops on the
    /// first failing cycle rather than retrying forever; the un-drained
    /// remainder survives in the buffer log for the next start.
    pub async fn drain(&self) -> Result<()> {
        loop {
            let outcome = self.run_replay_cycle().await?;
            if self.buffer.lock().is_empty() {
                return Ok(());
            }
            if outcome.persisted == 0 && !outcome.skipped {
                return Ok(());
            }
        }
    }

    /// Current cursor position.
    pub fn cursor(&self) -> ReplayCursor {
        *self.cursor.lock()
    }
}
