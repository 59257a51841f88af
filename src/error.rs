//! Error types for the resilient cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the resilient cache.
///
/// Only configuration errors are fatal; durability and replay errors are
/// recoverable and retried on the next natural opportunity. An absent or
/// expired key is not an error: `get` returns `None` and `evict` returns
/// `false`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration rejected at load time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid key or value supplied by the caller
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Append to the durable buffer failed; the in-memory write still succeeded
    #[error("Durable buffer write failed: {source}")]
    DurabilityWrite {
        #[from]
        source: std::io::Error,
    },

    /// Backing-store write failed during a replay cycle; retried next tick
    #[error("Replay persistence failed: {0}")]
    ReplayPersist(String),
}

// == Result Type Alias ==
/// Convenience Result type for the resilient cache.
pub type Result<T> = std::result::Result<T, CacheError>;
