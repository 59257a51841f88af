//! Durable Buffer Module
//!
//! Append-only, crash-tolerant buffering of pending writes. Writes are
//! committed to a JSON-lines log before the put returns, and drained into
//! the backing store by the replay scheduler.

mod log;
mod record;

pub use log::DurableBuffer;
pub use record::BufferRecord;
