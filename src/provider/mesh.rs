//! Text-to-3D Provider
//!
//! Client for the hosted mesh generation API. Drives the two-stage model
//! pipeline: a `preview` submission produces fast low-fidelity geometry, a
//! `refine` submission textures a completed preview.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use async_trait::async_trait;

use super::{GenerationProvider, SubmitRequest, network_error, rejection, status};
use crate::types::{JobKind, JobStatus, RelayError, Result, TaskId};

const API_BASE: &str = "https://api.meshy.ai/v2";
const PROVIDER_NAME: &str = "mesh";

/// Text-to-3D provider with secure API key handling.
///
/// The key is optional at construction; its absence only fails the call
/// that would need it, keeping the endpoint failing closed instead of the
/// process failing at startup.
pub struct MeshProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl std::fmt::Debug for MeshProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &API_BASE)
            .finish()
    }
}

impl MeshProvider {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.map(SecretString::from),
            client: super::http_client()?,
        })
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            RelayError::ConfigurationMissing(
                "mesh provider API key (providers.mesh_api_key)".to_string(),
            )
        })
    }

    fn build_request(request: &SubmitRequest) -> Result<GenerationRequest> {
        match request.kind {
            JobKind::Preview => Ok(GenerationRequest {
                mode: "preview",
                prompt: Some(request.prompt.clone()),
                art_style: Some("realistic"),
                preview_task_id: None,
            }),
            JobKind::Refine => {
                let source = request.refine_source.as_ref().ok_or_else(|| {
                    RelayError::invalid_input("refine submission requires a preview task id")
                })?;
                Ok(GenerationRequest {
                    mode: "refine",
                    prompt: None,
                    art_style: None,
                    preview_task_id: Some(source.to_string()),
                })
            }
            JobKind::Skybox => Err(RelayError::invalid_input(
                "skybox jobs are not handled by the mesh provider",
            )),
        }
    }
}

#[async_trait]
impl GenerationProvider for MeshProvider {
    async fn submit(&self, request: &SubmitRequest) -> Result<TaskId> {
        let api_key = self.api_key()?;
        let body = Self::build_request(request)?;

        info!(mode = body.mode, "Submitting mesh generation");

        let response = self
            .client
            .post(format!("{}/text-to-3d", API_BASE))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(rejection(PROVIDER_NAME, response).await);
        }

        let status = response.status().as_u16();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| network_error(PROVIDER_NAME, e))?;

        payload
            .get("result")
            .and_then(Value::as_str)
            .map(TaskId::from)
            .ok_or_else(|| {
                RelayError::rejected(
                    PROVIDER_NAME,
                    status,
                    "response contained no task identifier",
                )
            })
    }

    async fn status(&self, task_id: &TaskId) -> Result<JobStatus> {
        let api_key = self.api_key()?;

        debug!(%task_id, "Fetching mesh task status");

        let response = self
            .client
            .get(format!("{}/text-to-3d/{}", API_BASE, task_id))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| network_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(rejection(PROVIDER_NAME, response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| network_error(PROVIDER_NAME, e))?;

        Ok(status::classify(&body))
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

// Request types

#[derive(Debug, Serialize)]
struct GenerationRequest {
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    art_style: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview_task_id: Option<String>,
}
