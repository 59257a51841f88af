//! Replay Task
//!
//! The timer half of the replay scheduler. The scheduler itself owns no
//! thread; this helper gives the composition root a ready-made periodic
//! driver for `run_replay_cycle`.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::replay::ReplayScheduler;

/// Spawns a background task that runs a replay cycle on a fixed interval.
///
/// Cycle failures are logged and retried on the next tick; the scheduler's
/// own guard makes overlapping ticks skip rather than queue. The returned
/// handle can be aborted during graceful shutdown (optionally after a
/// final `scheduler.drain()`).
pub fn spawn_replay_task(
    scheduler: Arc<ReplayScheduler>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting replay task with interval {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            match scheduler.run_replay_cycle().await {
                Ok(outcome) if outcome.persisted > 0 => {
                    info!("Replay: persisted {} buffered records", outcome.persisted);
                }
                Ok(_) => {
                    debug!("Replay: nothing to persist");
                }
                Err(e) => {
                    warn!("Replay cycle failed, will retry next tick: {}", e);
                }
            }
        }
    })
}
