//! Job Domain Types
//!
//! The orchestrator's view of an externally-hosted generation task. The
//! authoritative state always lives with the provider and is re-fetched on
//! each poll; nothing here caches intermediate status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientId, TaskId};

/// Generation job kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// First stage of the model pipeline: fast, low-fidelity geometry
    Preview,
    /// Second stage: texture refinement of a completed preview
    Refine,
    /// Single-stage panoramic skybox generation
    Skybox,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Refine => "refine",
            Self::Skybox => "skybox",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a job as observed from a single provider poll.
///
/// Terminal set = `{Succeeded, Failed, Expired}`. Once a task has been
/// observed terminal it must never regress; callers treat the first terminal
/// observation as final.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Queued upstream, no work started
    Pending,
    /// Running, with provider-reported completion percentage
    InProgress { progress: u8 },
    /// Finished; the payload is the provider's raw success body
    Succeeded(ResultPayload),
    /// Provider reported an error or abort state
    Failed { message: String },
    /// Task aged out upstream before completing
    Expired,
}

impl JobStatus {
    /// Whether no further transition can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed { .. } | Self::Expired)
    }

    /// Completion percentage, when the status carries one
    pub fn progress(&self) -> Option<u8> {
        match self {
            Self::InProgress { progress } => Some(*progress),
            Self::Succeeded(_) => Some(100),
            _ => None,
        }
    }
}

/// Provider-specific success payload, kept opaque until asset resolution.
///
/// Shapes vary per provider (and sometimes per response), so the bag is
/// probed defensively rather than deserialized into a fixed struct.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPayload(Value);

impl ResultPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for ResultPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Canonical asset reference extracted from a terminal success payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    /// Directly-fetchable URL of the generated asset
    pub asset_url: String,
    /// Optional preview image URL
    pub thumbnail_url: Option<String>,
}

/// Server-side bookkeeping record for a submitted job.
///
/// Held in process memory only; dropped once the job settles.
#[derive(Debug, Clone)]
pub struct Job {
    /// Opaque provider task identifier
    pub task_id: TaskId,
    pub kind: JobKind,
    /// Quota bucket the job was admitted under
    pub client_id: ClientId,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(task_id: TaskId, kind: JobKind, client_id: ClientId) -> Self {
        Self {
            task_id,
            kind,
            client_id,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_classification() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress { progress: 35 }.is_terminal());
        assert!(JobStatus::Succeeded(ResultPayload::new(json!({}))).is_terminal());
        assert!(
            JobStatus::Failed {
                message: "boom".into()
            }
            .is_terminal()
        );
        assert!(JobStatus::Expired.is_terminal());
    }

    #[test]
    fn test_progress_reporting() {
        assert_eq!(JobStatus::Pending.progress(), None);
        assert_eq!(JobStatus::InProgress { progress: 35 }.progress(), Some(35));
        assert_eq!(
            JobStatus::Succeeded(ResultPayload::new(json!({}))).progress(),
            Some(100)
        );
        assert_eq!(JobStatus::Expired.progress(), None);
    }

    #[test]
    fn test_job_kind_roundtrip() {
        assert_eq!(JobKind::Preview.as_str(), "preview");
        assert_eq!(JobKind::Refine.to_string(), "refine");
        assert_eq!(
            serde_json::to_string(&JobKind::Skybox).unwrap(),
            "\"skybox\""
        );
    }
}
