//! Buffer Record Module
//!
//! The unit stored in the durable buffer log: one pending write awaiting
//! replay into the backing store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Buffer Record ==
/// A single pending write in the durable buffer.
///
/// Sequence numbers are strictly increasing and define both replay order
/// and the de-duplication key: when several records exist for the same
/// cache key, only the one with the highest sequence needs replaying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferRecord {
    /// Monotonic id assigned at append time
    pub sequence: u64,
    /// Cache key
    pub key: String,
    /// Value at the time of the write
    pub value: String,
    /// Wall-clock time the write was enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl BufferRecord {
    /// Creates a record stamped with the current wall-clock time.
    pub fn new(sequence: u64, key: String, value: String) -> Self {
        Self {
            sequence,
            key,
            value,
            enqueued_at: Utc::now(),
        }
    }
}
