//! Persistence Module
//!
//! The narrow port between the cache core and permanent storage. Any
//! concrete store (relational, document, flat file) implements
//! [`BackingStore`] behind this boundary; the core stays storage-agnostic.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use file::JsonFileBackingStore;
pub use memory::InMemoryBackingStore;

// == Backing Store Port ==
/// Permanent key-value storage behind the replay scheduler.
///
/// `persist` must be idempotent / last-write-wins: replay delivers
/// at-least-once, so the same key may be written more than once with the
/// same or newer value. Failures are ordinary recoverable errors, never
/// fatal to the process.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Writes a key-value pair; overwrites any previous value for the key.
    async fn persist(&self, key: &str, value: &str) -> Result<()>;

    /// Loads every persisted pair, used to rehydrate the cache at startup.
    async fn load_all(&self) -> Result<Vec<(String, String)>>;
}
