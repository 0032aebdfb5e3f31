//! Pipeline Coordination
//!
//! Chains the two-stage model pipeline: a refine submission continues a
//! completed preview rather than starting a new logical job, so it neither
//! re-runs admission nor takes a quota slot of its own.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::registry::JobRegistry;
use crate::constants::refine as refine_constants;
use crate::provider::{SharedGenerationProvider, SubmitRequest};
use crate::types::{Job, JobKind, RelayError, Result, TaskId};

/// Coordinates preview → refine chaining against the mesh provider
pub struct PipelineCoordinator {
    provider: SharedGenerationProvider,
    registry: Arc<JobRegistry>,
    /// Ceiling for the refine submission call itself, not the refine job.
    /// Distinguishes "provider is slow to acknowledge" from "job is slow
    /// to complete".
    submit_timeout: Duration,
}

impl PipelineCoordinator {
    pub fn new(provider: SharedGenerationProvider, registry: Arc<JobRegistry>) -> Self {
        Self {
            provider,
            registry,
            submit_timeout: Duration::from_secs(refine_constants::SUBMIT_TIMEOUT_SECS),
        }
    }

    #[cfg(test)]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Submit the refinement stage for a completed preview.
    ///
    /// Fails with [`RelayError::MissingSource`], before any provider call,
    /// unless the preview task settled successfully. Returns the new task
    /// handle; polling it to completion is the caller's business.
    pub async fn refine(&self, preview_task_id: &TaskId) -> Result<TaskId> {
        if preview_task_id.as_str().trim().is_empty() {
            return Err(RelayError::MissingSource(String::new()));
        }

        let source = self
            .registry
            .succeeded_preview(preview_task_id)
            .ok_or_else(|| RelayError::MissingSource(preview_task_id.to_string()))?;

        let request = SubmitRequest::refine(preview_task_id.clone());
        let task_id = tokio::time::timeout(self.submit_timeout, self.provider.submit(&request))
            .await
            .map_err(|_| RelayError::timeout("refine submission", self.submit_timeout))??;

        info!(preview = %preview_task_id, refine = %task_id, "Refine stage submitted");

        // Continuation of the same logical job: tracked, but no quota slot
        self.registry.register(
            Job::new(task_id.clone(), JobKind::Refine, source.client_id),
            false,
        );

        Ok(task_id)
    }
}
