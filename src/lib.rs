//! Resilient Cache - An embeddable in-memory cache with durability
//!
//! Provides TTL expiry with per-key policy overrides and an optional
//! durable write buffer that survives process restarts. Buffered writes
//! are drained into a pluggable backing store on a fixed interval and
//! replayed into memory at startup.
//!
//! The library owns no timers or threads: the embedding process drives
//! `ReplayScheduler::run_replay_cycle` and the expiry sweep, either
//! directly or through the helpers in [`tasks`].

pub mod buffer;
pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;
pub mod replay;
pub mod tasks;

pub use buffer::{BufferRecord, DurableBuffer};
pub use cache::{CacheStats, CacheStore, Durability, PutOutcome, TtlPolicy};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use persistence::{BackingStore, InMemoryBackingStore, JsonFileBackingStore};
pub use replay::{rehydrate, ReplayOutcome, ReplayScheduler};
pub use tasks::{spawn_replay_task, spawn_sweep_task};
