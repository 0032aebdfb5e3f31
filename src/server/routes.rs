//! API Route Handlers
//!
//! Thin translation layer: derive the client identity, call the
//! orchestrator, and map every outcome, success or any [`RelayError`],
//! to a structured JSON response. The service-disabled flag short-circuits
//! each handler before any provider call or quota mutation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::orchestrator::StatusSnapshot;
use crate::quota::client_id_from_headers;
use crate::types::{RelayError, TaskId};

// =============================================================================
// Wire Schemas
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Optional so a missing field becomes our own 400, not a framework 422
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub preview_task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct SkyboxRequest {
    pub prompt: Option<String>,
}

/// JSON error body every failure is reported through
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let (current, limit) = match &self {
            RelayError::RateLimited { current, limit } => (Some(*current), Some(*limit)),
            _ => (None, None),
        };

        let body = ErrorBody {
            error: self.to_string(),
            current,
            limit,
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /generate`: admit and start a preview generation
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateRequest>,
) -> Response {
    if state.disabled {
        return RelayError::ServiceDisabled.into_response();
    }

    let Some(prompt) = body.prompt else {
        return RelayError::invalid_input("prompt is required").into_response();
    };

    let client = client_id_from_headers(&headers);
    let correlation = Uuid::new_v4();
    info!(%correlation, client = %client, "Generation requested");

    match state.orchestrator.submit_generation(&client, &prompt).await {
        Ok(task_id) => (
            StatusCode::ACCEPTED,
            Json(GenerateResponse {
                success: true,
                task_id,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /status?task_id=...`: one status snapshot, caller owns the cadence
pub async fn status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusParams>,
) -> Response {
    if state.disabled {
        return RelayError::ServiceDisabled.into_response();
    }

    let Some(task_id) = params.task_id.filter(|id| !id.is_empty()) else {
        return RelayError::invalid_input("task_id is required").into_response();
    };

    match state.orchestrator.check_status(&TaskId::new(task_id)).await {
        Ok(snapshot) => Json::<StatusSnapshot>(snapshot).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `POST /refine`: chain the refinement stage of a completed preview
pub async fn refine(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefineRequest>,
) -> Response {
    if state.disabled {
        return RelayError::ServiceDisabled.into_response();
    }

    let Some(preview_task_id) = body.preview_task_id.filter(|id| !id.is_empty()) else {
        return RelayError::MissingSource(String::new()).into_response();
    };

    match state
        .orchestrator
        .refine(&TaskId::new(preview_task_id))
        .await
    {
        Ok(task_id) => Json(RefineResponse { task_id }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `POST /skybox`: synchronous flow that blocks the request until the skybox
/// reaches a terminal state or the poll budget runs out
pub async fn skybox(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SkyboxRequest>,
) -> Response {
    if state.disabled {
        return RelayError::ServiceDisabled.into_response();
    }

    let Some(prompt) = body.prompt else {
        return RelayError::invalid_input("prompt is required").into_response();
    };

    let client = client_id_from_headers(&headers);
    let correlation = Uuid::new_v4();
    info!(%correlation, client = %client, "Skybox generation requested");

    match state.orchestrator.generate_skybox(&client, &prompt).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => e.into_response(),
    }
}
