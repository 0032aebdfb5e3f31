//! Status Polling
//!
//! Two polling shapes with very different resource profiles, kept as
//! distinct operations on purpose:
//!
//! - [`poll_once`]: one upstream query, returns whatever snapshot came
//!   back, terminal or not. The caller owns the cadence, so the server
//!   never sleeps on its behalf.
//! - [`SyncPoller::poll_until_terminal`]: server-owned loop for the skybox
//!   flow. Sleeps a fixed interval between queries, up to a hard attempt
//!   budget, holding the originating request open for the duration.

use std::time::Duration;

use tracing::{debug, info};

use crate::constants::poll as poll_constants;
use crate::provider::GenerationProvider;
use crate::types::{JobStatus, RelayError, Result, ResultPayload, TaskId};

/// One status query, no waiting. The snapshot may be non-terminal;
/// repeating the call is the caller's responsibility.
pub async fn poll_once(provider: &dyn GenerationProvider, task_id: &TaskId) -> Result<JobStatus> {
    provider.status(task_id).await
}

/// Cadence and budget for the synchronous polling loop
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed delay between consecutive queries
    pub interval: Duration,
    /// Hard ceiling on queries before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(poll_constants::INTERVAL_SECS),
            max_attempts: poll_constants::MAX_ATTEMPTS,
        }
    }
}

impl PollConfig {
    /// Worst-case wall-clock time the loop can hold a request open
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Server-owned polling loop: sleep, query, classify, repeat until a
/// terminal state or the attempt budget runs out.
#[derive(Debug, Clone, Default)]
pub struct SyncPoller {
    config: PollConfig,
}

impl SyncPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Drive a task to its terminal state.
    ///
    /// Returns the success payload, or:
    /// - [`RelayError::GenerationFailed`] when the provider reports an
    ///   error/abort/expired terminal state
    /// - [`RelayError::Timeout`] when the attempt budget is exhausted with
    ///   the task still running. Distinct from failure, since the job may
    ///   yet complete upstream
    ///
    /// Provider transport errors propagate immediately; status queries are
    /// not retried at this layer.
    pub async fn poll_until_terminal(
        &self,
        provider: &dyn GenerationProvider,
        task_id: &TaskId,
    ) -> Result<ResultPayload> {
        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.interval).await;

            let status = provider.status(task_id).await?;
            debug!(%task_id, attempt, ?status, "Poll attempt");

            match status {
                JobStatus::Succeeded(payload) => {
                    info!(%task_id, attempt, "Generation completed");
                    return Ok(payload);
                }
                JobStatus::Failed { message } => {
                    info!(%task_id, attempt, %message, "Generation failed");
                    return Err(RelayError::GenerationFailed(message));
                }
                JobStatus::Expired => {
                    info!(%task_id, attempt, "Generation expired");
                    return Err(RelayError::GenerationFailed(
                        "Generation expired before completing".to_string(),
                    ));
                }
                JobStatus::Pending | JobStatus::InProgress { .. } => {}
            }
        }

        Err(RelayError::timeout("status poll", self.config.budget()))
    }
}
