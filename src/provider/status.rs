//! Provider Status Classification
//!
//! Providers disagree about where the status field lives (top level, or
//! nested under a `request` sub-object) and about vocabulary (`SUCCEEDED`
//! vs `complete`). This module is the single place those quirks are known;
//! everything downstream sees a classified [`JobStatus`].
//!
//! ## Classification
//!
//! - `complete` / `SUCCEEDED` → [`JobStatus::Succeeded`]
//! - `error` / `abort` / `FAILED` → [`JobStatus::Failed`]
//! - `EXPIRED` → [`JobStatus::Expired`]
//! - anything else → non-terminal, with progress defaulted to 0

use serde_json::Value;

use crate::types::{JobStatus, ResultPayload};

/// Fallback message when a failed task carries no usable error field
const GENERIC_FAILURE: &str = "Generation failed";

/// Classify a raw provider status body into a [`JobStatus`].
///
/// Probes both the top-level and `request`-nested shapes rather than
/// assuming one fixed schema.
pub fn classify(body: &Value) -> JobStatus {
    let Some(status) = status_field(body) else {
        // No status field anywhere: treat as queued rather than failing,
        // the next poll re-fetches authoritative state anyway.
        return JobStatus::Pending;
    };

    match status {
        "complete" | "SUCCEEDED" => JobStatus::Succeeded(success_payload(body)),
        "error" | "abort" | "FAILED" => JobStatus::Failed {
            message: error_message(body),
        },
        "EXPIRED" => JobStatus::Expired,
        "pending" | "PENDING" => JobStatus::Pending,
        _ => JobStatus::InProgress {
            progress: progress(body),
        },
    }
}

/// Queue-position hint some providers attach while a task is pending
pub fn queue_position(body: &Value) -> Option<u64> {
    probe(body, "queue_position").and_then(Value::as_u64)
}

/// Locate the status string, top-level first, then under `request`
fn status_field(body: &Value) -> Option<&str> {
    probe(body, "status").and_then(Value::as_str)
}

/// The payload asset resolution will probe later. For nested responses the
/// terminal `request` object is the payload; otherwise the whole body is.
fn success_payload(body: &Value) -> ResultPayload {
    let value = match body.get("request") {
        Some(nested) if nested.is_object() => nested.clone(),
        _ => body.clone(),
    };
    ResultPayload::new(value)
}

/// Progress percentage, defaulted to 0 when absent, clamped to 100
fn progress(body: &Value) -> u8 {
    probe(body, "progress")
        .and_then(Value::as_u64)
        .map(|p| p.min(100) as u8)
        .unwrap_or(0)
}

/// Extract the provider's error detail through an ordered fallback chain
fn error_message(body: &Value) -> String {
    if let Some(message) = probe(body, "task_error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        && !message.is_empty()
    {
        return message.to_string();
    }

    for field in ["error_message", "message"] {
        if let Some(message) = probe(body, field).and_then(Value::as_str)
            && !message.is_empty()
        {
            return message.to_string();
        }
    }

    GENERIC_FAILURE.to_string()
}

/// Look a field up at the top level, then under the `request` sub-object
fn probe<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    body.get(field)
        .or_else(|| body.get("request").and_then(|r| r.get(field)))
}
