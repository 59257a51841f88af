//! Background Tasks Module
//!
//! Ready-made periodic drivers for the composition root. The cache core
//! and replay scheduler own no timers of their own; the embedding process
//! spawns these (or its own equivalents) and aborts the handles at
//! shutdown.
//!
//! # Tasks
//! - TTL Sweep: removes expired cache entries at configured intervals
//! - Replay: drains the durable buffer into the backing store

mod replay;
mod sweep;

pub use replay::spawn_replay_task;
pub use sweep::spawn_sweep_task;
