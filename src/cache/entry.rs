//! Cache Entry Module
//!
//! Defines the structure for individual cache entries. Every entry carries
//! an expiration deadline; the TTL policy guarantees one is always resolved.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds); always set
    pub expires_at: u64,
    /// Whether a pending durable-buffer record exists for this key
    pub buffered: bool,
}

impl CacheEntry {
    /// Creates a new cache entry expiring `ttl_ms` milliseconds from now.
    pub fn new(value: String, ttl_ms: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl_ms,
            buffered: false,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired when the current time is
    /// greater than or equal to the expiration time, so once the TTL has
    /// fully elapsed the entry is immediately expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    /// Returns remaining TTL in milliseconds, 0 if already expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
