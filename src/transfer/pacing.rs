//! Pacing between batch submissions.
//!
//! Successive transactions from one account are spaced by a fixed interval so
//! the upstream RPC provider neither rate-limits nor reorders them. The
//! interval is not configurable and never applies after the final batch.

use std::time::Duration;

use crate::lifecycle::ShutdownSignal;
use crate::transfer::planner::Batch;

/// Delay between the end of one batch and the start of the next.
pub const BATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Whether a pause follows `batch`.
pub fn needs_pause(batch: &Batch<'_>) -> bool {
    !batch.is_last()
}

/// Sleep for [`BATCH_INTERVAL`].
pub async fn pause() {
    tokio::time::sleep(BATCH_INTERVAL).await;
}

/// Sleep for [`BATCH_INTERVAL`] unless shutdown fires first.
///
/// Returns `true` when the pause was cut short by shutdown.
pub async fn pause_or_shutdown(signal: Option<&mut ShutdownSignal>) -> bool {
    match signal {
        Some(signal) => {
            tokio::select! {
                _ = pause() => false,
                _ = signal.triggered() => true,
            }
        }
        None => {
            pause().await;
            false
        }
    }
}
