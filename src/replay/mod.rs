//! Replay Module
//!
//! Moves durable state in both directions: the scheduler drains buffered
//! writes into the backing store on a fixed interval, and rehydration
//! restores persisted and buffered entries into memory at startup.

mod rehydrate;
mod scheduler;

pub use rehydrate::rehydrate;
pub use scheduler::{ReplayCursor, ReplayOutcome, ReplayScheduler};
