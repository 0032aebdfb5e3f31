//! Generation Provider Abstraction
//!
//! Defines the [`GenerationProvider`] trait the orchestrator drives. A
//! provider knows how to start a job (exactly one outbound call, no retries)
//! and how to fetch a single status snapshot. Everything stateful (quota,
//! bookkeeping, polling cadence) lives above this seam.
//!
//! ## Modules
//!
//! - `mesh`: text-to-3D provider (preview → refine pipeline)
//! - `skybox`: panoramic skybox provider (`request`-nested status payloads)
//! - `status`: defensive classification of heterogeneous status bodies

mod mesh;
mod skybox;
pub mod status;

pub use mesh::MeshProvider;
pub use skybox::SkyboxProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{JobKind, JobStatus, RelayError, Result, TaskId};

/// Shared provider handle for concurrent access across request handlers.
pub type SharedGenerationProvider = Arc<dyn GenerationProvider + Send + Sync>;

/// A validated request to start a generation job
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Creative prompt, already validated non-empty
    pub prompt: String,
    pub kind: JobKind,
    /// For [`JobKind::Refine`]: the succeeded preview task to refine.
    /// The caller guarantees the referenced preview reached success.
    pub refine_source: Option<TaskId>,
}

impl SubmitRequest {
    pub fn preview(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: JobKind::Preview,
            refine_source: None,
        }
    }

    pub fn refine(source: TaskId) -> Self {
        Self {
            prompt: String::new(),
            kind: JobKind::Refine,
            refine_source: Some(source),
        }
    }

    pub fn skybox(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: JobKind::Skybox,
            refine_source: None,
        }
    }
}

/// External generation provider contract: submit → opaque id → poll →
/// terminal state.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Start a job. Exactly one outbound call; submission is never retried
    /// at this layer.
    async fn submit(&self, request: &SubmitRequest) -> Result<TaskId>;

    /// Fetch one status snapshot. Exactly one outbound call; cadence and
    /// attempt budgets belong to the poller.
    async fn status(&self, task_id: &TaskId) -> Result<JobStatus>;

    /// Provider name for logging and error attribution
    fn name(&self) -> &'static str;
}

/// Build the HTTP client providers share their timeout discipline through
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
        .timeout(Duration::from_secs(net_constants::REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Map a network-level reqwest failure to the unified error type
pub(crate) fn network_error(provider: &'static str, err: reqwest::Error) -> RelayError {
    RelayError::ProviderUnreachable {
        provider,
        message: err.to_string(),
    }
}

/// Turn a non-success provider response into `ProviderRejected`, carrying
/// whatever error body the provider sent.
pub(crate) async fn rejection(provider: &'static str, response: reqwest::Response) -> RelayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RelayError::rejected(provider, status, body)
}
