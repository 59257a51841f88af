//! Cache Module
//!
//! Provides in-memory caching with TTL policy resolution, an ordered
//! expiry index and optional durable buffering of writes.

mod entry;
mod expiry;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use expiry::ExpiryIndex;
pub use stats::CacheStats;
pub use store::{CacheStore, Durability, PutOutcome};
pub use ttl::TtlPolicy;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
