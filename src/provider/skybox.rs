//! Skybox Provider
//!
//! Client for the hosted panoramic skybox API. Single-stage: one submission,
//! then status polling until the provider reports a terminal state. Status
//! payloads are usually nested under a `request` sub-object and carry a
//! queue-position hint while pending; classification tolerates both shapes.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use async_trait::async_trait;

use super::{GenerationProvider, SubmitRequest, network_error, rejection, status};
use crate::types::{JobStatus, RelayError, Result, TaskId};

const API_BASE: &str = "https://backend.blockadelabs.com/api/v1";
const PROVIDER_NAME: &str = "skybox";

/// Skybox provider with secure API key handling
pub struct SkyboxProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl std::fmt::Debug for SkyboxProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyboxProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &API_BASE)
            .finish()
    }
}

impl SkyboxProvider {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.map(SecretString::from),
            client: super::http_client()?,
        })
    }

    fn api_key(&self) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            RelayError::ConfigurationMissing(
                "skybox provider API key (providers.skybox_api_key)".to_string(),
            )
        })
    }

    /// The submission response carries the new request id either at the top
    /// level or nested, and either as a number or a string.
    fn extract_task_id(payload: &Value) -> Option<TaskId> {
        let id = payload
            .get("id")
            .or_else(|| payload.get("request").and_then(|r| r.get("id")))?;

        match id {
            Value::String(s) if !s.is_empty() => Some(TaskId::new(s.clone())),
            Value::Number(n) => Some(TaskId::new(n.to_string())),
            _ => None,
        }
    }
}

#[async_trait]
impl GenerationProvider for SkyboxProvider {
    async fn submit(&self, request: &SubmitRequest) -> Result<TaskId> {
        let api_key = self.api_key()?;

        info!("Submitting skybox generation");

        let response = self
            .client
            .post(format!("{}/skybox", API_BASE))
            .header("x-api-key", api_key.expose_secret())
            .json(&SkyboxRequest {
                prompt: request.prompt.clone(),
            })
            .send()
            .await
            .map_err(|e| network_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(rejection(PROVIDER_NAME, response).await);
        }

        let http_status = response.status().as_u16();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| network_error(PROVIDER_NAME, e))?;

        Self::extract_task_id(&payload).ok_or_else(|| {
            RelayError::rejected(
                PROVIDER_NAME,
                http_status,
                "response contained no request identifier",
            )
        })
    }

    async fn status(&self, task_id: &TaskId) -> Result<JobStatus> {
        let api_key = self.api_key()?;

        debug!(%task_id, "Fetching skybox request status");

        let response = self
            .client
            .get(format!("{}/requests/{}", API_BASE, task_id))
            .header("x-api-key", api_key.expose_secret())
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

        if let Some(position) = status::queue_position(&body) {
            debug!(%task_id, queue_position = position, "Skybox request queued");
        }

        Ok(status::classify(&body))
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

// Request types

#[derive(Debug, Serialize)]
struct SkyboxRequest {
    prompt: String,
}
