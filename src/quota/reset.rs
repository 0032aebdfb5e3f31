//! Periodic Quota Reset
//!
//! Safety net against leaked counters (a crashed polling loop, a client
//! that never polls again): the ENTIRE client map is cleared on a fixed
//! wall-clock cadence, regardless of in-flight jobs. A job that straddles a
//! reset frees its slot early and its eventual terminal decrement saturates
//! at zero. This is a deliberate full-map clear, not a per-entry TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::QuotaStore;

/// Scheduled task clearing the quota map on a fixed interval.
///
/// Started once on process init; stopped through its handle on shutdown.
pub struct QuotaResetTask {
    store: Arc<dyn QuotaStore>,
    interval: Duration,
}

impl QuotaResetTask {
    pub fn new(store: Arc<dyn QuotaStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Spawn the reset loop, returning a handle that stops it
    pub fn start(self) -> QuotaResetHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();

        info!(interval_secs = self.interval.as_secs(), "Starting quota reset task");

        let handle = tokio::spawn(self.run(task_token));

        QuotaResetHandle { token, handle }
    }

    async fn run(self, shutdown: CancellationToken) {
        // First tick lands one full interval after start, not immediately
        let start = tokio::time::Instant::now() + self.interval;
        let mut interval = tokio::time::interval_at(start, self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Quota reset task stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.store.clear();
                    info!("Quota map cleared");
                }
            }
        }
    }
}

/// Stop handle for a running [`QuotaResetTask`]
pub struct QuotaResetHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl QuotaResetHandle {
    /// Cancel the loop and wait for it to exit
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
