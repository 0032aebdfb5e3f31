//! Job Orchestration
//!
//! The layer between the HTTP surface and the generation providers. Owns
//! the quota limiter, the job registry, and the polling/chaining logic;
//! guarantees that every admitted job releases its quota slot exactly once,
//! on the first observation of any terminal state: success, failure,
//! expiry, or a poll that gave up waiting.
//!
//! ## Modules
//!
//! - `registry`: in-memory job bookkeeping with exactly-once settlement
//! - `poller`: single-shot and bounded synchronous status polling
//! - `pipeline`: preview → refine chaining
//! - `resolver`: canonical asset-URL extraction from success payloads

pub mod pipeline;
pub mod poller;
pub mod registry;
pub mod resolver;

pub use pipeline::PipelineCoordinator;
pub use poller::{PollConfig, SyncPoller, poll_once};
pub use registry::{JobRegistry, SettleAction, SettledOutcome};

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::provider::{SharedGenerationProvider, SubmitRequest};
use crate::quota::RateLimiter;
use crate::types::{ClientId, Job, JobKind, JobStatus, RelayError, Result, TaskId};

/// Single-shot status snapshot, shaped for the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusSnapshot {
    Pending,
    InProgress { progress: u8 },
    Succeeded {
        asset_url: String,
        thumbnail_url: Option<String>,
    },
    Failed { message: String },
    Expired,
}

/// Result of a completed synchronous skybox generation
#[derive(Debug, Clone, Serialize)]
pub struct SkyboxOutput {
    pub task_id: TaskId,
    pub asset_url: String,
    pub thumbnail_url: Option<String>,
}

/// Facade over providers, quota, and job bookkeeping
pub struct Orchestrator {
    limiter: RateLimiter,
    registry: Arc<JobRegistry>,
    mesh: SharedGenerationProvider,
    skybox: SharedGenerationProvider,
    pipeline: PipelineCoordinator,
    poller: SyncPoller,
}

impl Orchestrator {
    pub fn new(
        mesh: SharedGenerationProvider,
        skybox: SharedGenerationProvider,
        limiter: RateLimiter,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let pipeline = PipelineCoordinator::new(mesh.clone(), registry.clone());
        Self {
            limiter,
            registry,
            mesh,
            skybox,
            pipeline,
            poller: SyncPoller::default(),
        }
    }

    /// Admission gate state for a client, without taking a slot
    pub fn quota_state(&self, client: &ClientId) -> crate::quota::Admission {
        self.limiter.check(client)
    }

    /// Start a preview generation for a client.
    ///
    /// Validation happens before any side effect; admission takes a quota
    /// slot that is released on the job's first terminal observation, or
    /// immediately when the submission itself fails and no job exists.
    pub async fn submit_generation(&self, client: &ClientId, prompt: &str) -> Result<TaskId> {
        validate_prompt(prompt)?;

        let admission = self.limiter.try_admit(client);
        if !admission.allowed {
            return Err(RelayError::RateLimited {
                current: admission.current,
                limit: admission.limit,
            });
        }

        let request = SubmitRequest::preview(prompt);
        match self.mesh.submit(&request).await {
            Ok(task_id) => {
                info!(client = %client, task = %task_id, "Preview generation submitted");
                self.registry.register(
                    Job::new(task_id.clone(), JobKind::Preview, client.clone()),
                    true,
                );
                Ok(task_id)
            }
            Err(e) => {
                // No job came into existence, so nothing will ever observe
                // a terminal state for it: give the slot back now.
                self.limiter.release(client);
                Err(e)
            }
        }
    }

    /// One status query for a model-generation task; the caller owns the
    /// polling cadence. Settles the job on its first terminal observation.
    pub async fn check_status(&self, task_id: &TaskId) -> Result<StatusSnapshot> {
        let status = poll_once(self.mesh.as_ref(), task_id).await?;

        match status {
            JobStatus::Pending => Ok(StatusSnapshot::Pending),
            JobStatus::InProgress { progress } => Ok(StatusSnapshot::InProgress { progress }),
            JobStatus::Succeeded(payload) => {
                self.settle(task_id, SettledOutcome::Succeeded);
                let asset = resolver::resolve(&payload)?;
                Ok(StatusSnapshot::Succeeded {
                    asset_url: asset.asset_url,
                    thumbnail_url: asset.thumbnail_url,
                })
            }
            JobStatus::Failed { message } => {
                self.settle(task_id, SettledOutcome::Failed);
                Ok(StatusSnapshot::Failed { message })
            }
            JobStatus::Expired => {
                self.settle(task_id, SettledOutcome::Expired);
                Ok(StatusSnapshot::Expired)
            }
        }
    }

    /// Chain the refinement stage of a completed preview
    pub async fn refine(&self, preview_task_id: &TaskId) -> Result<TaskId> {
        self.pipeline.refine(preview_task_id).await
    }

    /// Run a skybox generation to completion, holding the caller for the
    /// duration of the synchronous poll.
    pub async fn generate_skybox(&self, client: &ClientId, prompt: &str) -> Result<SkyboxOutput> {
        validate_prompt(prompt)?;

        let admission = self.limiter.try_admit(client);
        if !admission.allowed {
            return Err(RelayError::RateLimited {
                current: admission.current,
                limit: admission.limit,
            });
        }

        let request = SubmitRequest::skybox(prompt);
        let task_id = match self.skybox.submit(&request).await {
            Ok(task_id) => task_id,
            Err(e) => {
                self.limiter.release(client);
                return Err(e);
            }
        };

        info!(client = %client, task = %task_id, "Skybox generation submitted");
        self.registry.register(
            Job::new(task_id.clone(), JobKind::Skybox, client.clone()),
            true,
        );

        match self
            .poller
            .poll_until_terminal(self.skybox.as_ref(), &task_id)
            .await
        {
            Ok(payload) => {
                self.settle(&task_id, SettledOutcome::Succeeded);
                let asset = resolver::resolve(&payload)?;
                Ok(SkyboxOutput {
                    task_id,
                    asset_url: asset.asset_url,
                    thumbnail_url: asset.thumbnail_url,
                })
            }
            Err(e) => {
                // Failure and poll exhaustion are terminal for the quota
                // slot. Transport errors are not: the job may still be
                // running, and the periodic reset is the backstop for a
                // poll loop that never comes back.
                if e.is_terminal_outcome() {
                    self.settle(&task_id, SettledOutcome::Failed);
                } else {
                    warn!(task = %task_id, error = %e, "Skybox poll aborted without terminal state");
                }
                Err(e)
            }
        }
    }

    /// First-terminal-observation bookkeeping: mark settled and release the
    /// quota slot when the job held one.
    fn settle(&self, task_id: &TaskId, outcome: SettledOutcome) {
        if let Some(action) = self.registry.settle(task_id, outcome)
            && action.holds_slot
        {
            self.limiter.release(&action.client_id);
        }
    }
}

fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(RelayError::invalid_input("prompt must be a non-empty string"));
    }
    Ok(())
}

// =============================================================================
// Test Support
// =============================================================================


#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use crate::quota::InMemoryQuotaStore;
    use crate::types::ResultPayload;
    use serde_json::json;

    fn orchestrator(
        mesh: ScriptedProvider,
        skybox: ScriptedProvider,
        limit: u32,
    ) -> Orchestrator {
        let limiter = RateLimiter::new(Arc::new(InMemoryQuotaStore::new()), limit);
        Orchestrator::new(Arc::new(mesh), Arc::new(skybox), limiter)
    }

    fn succeeded_model(url: &str) -> JobStatus {
        JobStatus::Succeeded(ResultPayload::new(json!({
            "model_urls": {"glb": url}
        })))
    }

    #[tokio::test]
    async fn test_end_to_end_generation_flow() {
        let mesh = ScriptedProvider::new("mesh")
            .with_submit_ids(vec![TaskId::new("T1")])
            .with_statuses(vec![
                JobStatus::InProgress { progress: 35 },
                succeeded_model("https://cdn.example/T1.glb"),
            ]);
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let task_id = orch
            .submit_generation(&client, "a red sports car")
            .await
            .unwrap();
        assert_eq!(task_id, TaskId::new("T1"));
        assert_eq!(orch.quota_state(&client).current, 1);

        let first = orch.check_status(&task_id).await.unwrap();
        assert_eq!(first, StatusSnapshot::InProgress { progress: 35 });
        assert_eq!(orch.quota_state(&client).current, 1);

        let second = orch.check_status(&task_id).await.unwrap();
        assert_eq!(
            second,
            StatusSnapshot::Succeeded {
                asset_url: "https://cdn.example/T1.glb".to_string(),
                thumbnail_url: None,
            }
        );

        // Counter returns to its pre-submission value
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test]
    async fn test_third_submission_rejected_with_counts() {
        let mesh = ScriptedProvider::new("mesh").with_submit_ids(vec![
            TaskId::new("T1"),
            TaskId::new("T2"),
            TaskId::new("T3"),
        ]);
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        orch.submit_generation(&client, "one").await.unwrap();
        orch.submit_generation(&client, "two").await.unwrap();

        let err = orch.submit_generation(&client, "three").await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::RateLimited {
                current: 2,
                limit: 2
            }
        ));

        // A different client is admitted independently
        let other = ClientId::new("10.0.0.2");
        assert!(orch.submit_generation(&other, "four").await.is_ok());
    }

    #[tokio::test]
    async fn test_repeated_terminal_polls_decrement_once() {
        let mesh = ScriptedProvider::new("mesh")
            .with_submit_ids(vec![TaskId::new("T1"), TaskId::new("T2")])
            .with_statuses(vec![succeeded_model("https://cdn.example/T1.glb")]);
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let first = orch.submit_generation(&client, "one").await.unwrap();
        orch.submit_generation(&client, "two").await.unwrap();
        assert_eq!(orch.quota_state(&client).current, 2);

        // The scripted provider repeats the terminal state; every poll
        // resolves the same URL, but only the first releases the slot.
        for _ in 0..3 {
            let snapshot = orch.check_status(&first).await.unwrap();
            assert_eq!(
                snapshot,
                StatusSnapshot::Succeeded {
                    asset_url: "https://cdn.example/T1.glb".to_string(),
                    thumbnail_url: None,
                }
            );
        }

        assert_eq!(orch.quota_state(&client).current, 1);
    }

    #[tokio::test]
    async fn test_invalid_prompt_has_no_side_effects() {
        let mesh = ScriptedProvider::new("mesh");
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let err = orch.submit_generation(&client, "   ").await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test]
    async fn test_submission_failure_releases_slot() {
        let mesh = ScriptedProvider::new("mesh").failing_submit();
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let err = orch.submit_generation(&client, "a car").await.unwrap_err();
        assert!(matches!(err, RelayError::ProviderRejected { .. }));
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test]
    async fn test_failed_generation_settles_and_releases() {
        let mesh = ScriptedProvider::new("mesh")
            .with_submit_ids(vec![TaskId::new("T1")])
            .with_statuses(vec![JobStatus::Failed {
                message: "nsfw prompt".to_string(),
            }]);
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let task_id = orch.submit_generation(&client, "a car").await.unwrap();
        let snapshot = orch.check_status(&task_id).await.unwrap();
        assert_eq!(
            snapshot,
            StatusSnapshot::Failed {
                message: "nsfw prompt".to_string()
            }
        );
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test]
    async fn test_no_asset_url_still_releases_slot() {
        let mesh = ScriptedProvider::new("mesh")
            .with_submit_ids(vec![TaskId::new("T1")])
            .with_statuses(vec![JobStatus::Succeeded(ResultPayload::new(json!({
                "status": "SUCCEEDED"
            })))]);
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let task_id = orch.submit_generation(&client, "a car").await.unwrap();
        let err = orch.check_status(&task_id).await.unwrap_err();
        assert!(matches!(err, RelayError::NoAssetUrl));
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skybox_flow_resolves_and_releases() {
        let skybox = ScriptedProvider::new("skybox")
            .with_submit_ids(vec![TaskId::new("S1")])
            .with_statuses(vec![
                JobStatus::Pending,
                JobStatus::InProgress { progress: 60 },
                JobStatus::Succeeded(ResultPayload::new(json!({
                    "file_url": "https://cdn.example/sky.jpg",
                    "thumb_url": "https://cdn.example/sky-small.jpg"
                }))),
            ]);
        let orch = orchestrator(ScriptedProvider::new("mesh"), skybox, 2);
        let client = ClientId::new("10.0.0.1");

        let output = orch
            .generate_skybox(&client, "sunset over mountains")
            .await
            .unwrap();
        assert_eq!(output.task_id, TaskId::new("S1"));
        assert_eq!(output.asset_url, "https://cdn.example/sky.jpg");
        assert_eq!(
            output.thumbnail_url.as_deref(),
            Some("https://cdn.example/sky-small.jpg")
        );
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skybox_failure_releases_slot() {
        let skybox = ScriptedProvider::new("skybox")
            .with_submit_ids(vec![TaskId::new("S1")])
            .with_statuses(vec![JobStatus::Failed {
                message: "abort".to_string(),
            }]);
        let orch = orchestrator(ScriptedProvider::new("mesh"), skybox, 2);
        let client = ClientId::new("10.0.0.1");

        let err = orch.generate_skybox(&client, "a storm").await.unwrap_err();
        assert!(matches!(err, RelayError::GenerationFailed(_)));
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skybox_poll_timeout_releases_slot() {
        let skybox = ScriptedProvider::new("skybox")
            .with_submit_ids(vec![TaskId::new("S1")])
            .with_statuses(vec![JobStatus::InProgress { progress: 10 }]);
        let orch = orchestrator(ScriptedProvider::new("mesh"), skybox, 2);
        let client = ClientId::new("10.0.0.1");

        let err = orch.generate_skybox(&client, "a storm").await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout { .. }));
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skybox_transport_error_leaves_slot_for_reset() {
        let skybox = ScriptedProvider::new("skybox")
            .with_submit_ids(vec![TaskId::new("S1")])
            .failing_status();
        let orch = orchestrator(ScriptedProvider::new("mesh"), skybox, 2);
        let client = ClientId::new("10.0.0.1");

        let err = orch.generate_skybox(&client, "a storm").await.unwrap_err();
        assert!(matches!(err, RelayError::ProviderUnreachable { .. }));
        // Not a terminal observation: the periodic reset reclaims the slot
        assert_eq!(orch.quota_state(&client).current, 1);
    }

    #[tokio::test]
    async fn test_refine_after_completed_preview() {
        let mesh = ScriptedProvider::new("mesh")
            .with_submit_ids(vec![TaskId::new("T1"), TaskId::new("R1")])
            .with_statuses(vec![succeeded_model("https://cdn.example/T1.glb")]);
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);
        let client = ClientId::new("10.0.0.1");

        let preview = orch.submit_generation(&client, "a car").await.unwrap();
        orch.check_status(&preview).await.unwrap();

        // Refine re-runs no admission: quota is already back at zero and
        // stays there.
        let refine_id = orch.refine(&preview).await.unwrap();
        assert_eq!(refine_id, TaskId::new("R1"));
        assert_eq!(orch.quota_state(&client).current, 0);
    }

    #[tokio::test]
    async fn test_refine_without_completed_preview_rejected() {
        let mesh = ScriptedProvider::new("mesh");
        let orch = orchestrator(mesh, ScriptedProvider::new("skybox"), 2);

        let err = orch.refine(&TaskId::new("never-ran")).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingSource(_)));
    }
}
