//! Cache Store Module
//!
//! Main cache engine combining the key-value map with the expiry index,
//! TTL policy resolution and optional durable buffering. The entry map and
//! the expiry index are one unit of shared state: callers guard the whole
//! store with a single lock and the two are always updated together.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::buffer::DurableBuffer;
use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, ExpiryIndex, TtlPolicy, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Put Outcome ==
/// Durability outcome of a put.
///
/// The in-memory write has already succeeded in every variant; `Failed`
/// means the entry is cached but will not survive a crash until a later
/// write for the same key buffers successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum Durability {
    /// Buffering is disabled by configuration
    Disabled,
    /// The write was committed to the durable buffer with this sequence
    Buffered(u64),
    /// The durable append failed; the write is in memory only
    Failed,
}

/// Result of a successful put.
#[derive(Debug, Clone, PartialEq)]
pub struct PutOutcome {
    /// Expiration deadline stamped on the entry (Unix milliseconds)
    pub expires_at: u64,
    /// Whether the write reached the durable buffer
    pub durability: Durability,
}

// == Cache Store ==
/// Main cache storage with TTL expiry and optional durable buffering.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Expiration deadline index, kept in lockstep with `entries`
    expiry: ExpiryIndex,
    /// TTL resolution snapshot, consulted on every put
    ttl_policy: TtlPolicy,
    /// Durable buffer handle, present when buffering is enabled
    buffer: Option<Arc<Mutex<DurableBuffer>>>,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructors ==
    /// Creates a store without durable buffering.
    pub fn new(ttl_policy: TtlPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            expiry: ExpiryIndex::new(),
            ttl_policy,
            buffer: None,
            stats: CacheStats::new(),
        }
    }

    /// Creates a store that appends every put to the given durable buffer.
    pub fn with_buffer(ttl_policy: TtlPolicy, buffer: Arc<Mutex<DurableBuffer>>) -> Self {
        Self {
            buffer: Some(buffer),
            ..Self::new(ttl_policy)
        }
    }

    // == Put ==
    /// Stores a key-value pair.
    ///
    /// The TTL policy stamps the expiration deadline; if the key already
    /// exists the value is overwritten and the deadline reset. When durable
    /// buffering is enabled the write is appended to the buffer before
    /// returning. A buffer failure does not fail the put: the outcome
    /// carries [`Durability::Failed`] and a warning is logged.
    pub fn put(&mut self, key: String, value: String) -> Result<PutOutcome> {
        validate_key(&key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let ttl = self.ttl_policy.resolve(&key);
        let mut entry = CacheEntry::new(value.clone(), ttl.as_millis() as u64);

        let durability = match &self.buffer {
            None => Durability::Disabled,
            Some(buffer) => match buffer.lock().append(&key, &value) {
                Ok(sequence) => {
                    entry.buffered = true;
                    Durability::Buffered(sequence)
                }
                Err(e) => {
                    warn!("Durable buffer append failed for '{}': {}", key, e);
                    self.stats.record_buffer_failure();
                    Durability::Failed
                }
            },
        };

        let expires_at = entry.expires_at;
        self.expiry.track(&key, expires_at);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(PutOutcome {
            expires_at,
            durability,
        })
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Lazy expiry: an entry past its deadline is removed and reported
    /// absent even if no sweep has run yet.
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.expiry.untrack(key);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_expired_read();
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Evict ==
    /// Removes an entry and its expiry record unconditionally.
    ///
    /// Pending buffer records for the key are left alone; they still
    /// replay into the backing store. Returns false if the key was absent.
    pub fn evict(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.expiry.untrack(key);
            self.stats.record_eviction();
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Size ==
    /// Returns the number of live (non-expired) entries.
    ///
    /// Sweeps expired entries first, so the count never includes entries
    /// past their deadline.
    pub fn size(&mut self) -> usize {
        self.sweep_expired();
        self.entries.len()
    }

    // == Sweep Expired ==
    /// Removes all entries whose deadline has passed.
    ///
    /// Returns the number of entries removed. Driven by the expiry index,
    /// so cost is proportional to the number of expired entries.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired = self.expiry.sweep(now);
        let count = expired.len();

        for key in expired {
            self.entries.remove(&key);
        }
        if count > 0 {
            self.stats.record_swept(count);
            self.stats.set_total_entries(self.entries.len());
        }
        count
    }

    // == Mark Persisted ==
    /// Clears the `buffered` flag for keys whose pending records have been
    /// replayed into the backing store.
    ///
    /// Called by the replay scheduler after `ack`; `keys` must exclude any
    /// key that picked up a newer pending record in the meantime.
    pub fn mark_persisted<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let mut count = 0;
        for key in keys {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.buffered = false;
            }
            count += 1;
        }
        self.stats.record_replayed(count);
    }

    // == Rehydrate Entry ==
    /// Restores an entry at startup without touching the durable buffer.
    ///
    /// The deadline is stamped fresh from the current TTL policy. Entries
    /// restored from pending buffer records pass `buffered = true` so they
    /// are still recognized as awaiting replay.
    pub fn rehydrate_entry(&mut self, key: String, value: String, buffered: bool) -> Result<()> {
        validate_key(&key)?;
        let ttl = self.ttl_policy.resolve(&key);
        let mut entry = CacheEntry::new(value, ttl.as_millis() as u64);
        entry.buffered = buffered;
        self.expiry.track(&key, entry.expires_at);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Reload TTL Policy ==
    /// Replaces the TTL policy snapshot as a whole unit.
    ///
    /// Existing entries keep their stamped deadlines; the new policy
    /// applies from the next put.
    pub fn reload_ttl_policy(&mut self, policy: TtlPolicy) {
        self.ttl_policy = policy;
    }

    /// Returns whether the entry for `key` is awaiting replay.
    pub fn is_buffered(&self, key: &str) -> bool {
        self.entries.get(key).map(|e| e.buffered).unwrap_or(false)
    }

    /// Earliest pending expiry deadline, if any.
    pub fn next_expiry(&self) -> Option<u64> {
        self.expiry.peek_next()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Key must not be empty".to_string(),
        ));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
