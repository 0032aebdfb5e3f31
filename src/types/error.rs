//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Every failure an endpoint can produce maps to exactly one variant, and
//! every variant maps to a structured JSON response. None of them should
//! ever crash the process.
//!
//! ## Error Groups
//!
//! - **Request validation**: caller mistakes, caught before any side effect
//! - **Quota**: admission denied, reported with current/limit counts
//! - **Provider**: upstream rejections and network-level failures
//! - **Job lifecycle**: poll timeouts, terminal failures, resolution misses
//! - **Configuration**: missing credentials fail closed, never call out

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Request Validation
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Quota
    // -------------------------------------------------------------------------
    /// Admission denied; carries the counts the caller needs to decide
    /// whether to wait or give up.
    #[error("Concurrency limit reached: {current} of {limit} generations in flight")]
    RateLimited { current: u32, limit: u32 },

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    /// The provider answered with a non-success status. The body is passed
    /// through verbatim so callers see whatever detail the provider gave.
    #[error("{provider} rejected the request ({status}): {body}")]
    ProviderRejected {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Network-level failure before any provider response was received.
    #[error("{provider} unreachable: {message}")]
    ProviderUnreachable {
        provider: &'static str,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Job Lifecycle
    // -------------------------------------------------------------------------
    /// A bounded wait exhausted its budget without a terminal state.
    /// Distinct from `ProviderRejected`: the job may still be running.
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The provider explicitly reported an error/abort/expired terminal state.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Terminal success, but no recognizable asset URL in the payload.
    #[error("Generation succeeded but the result contained no usable asset URL")]
    NoAssetUrl,

    /// Refine requested for a preview that never reached success.
    #[error("No completed preview generation found for task '{0}'")]
    MissingSource(String),

    // -------------------------------------------------------------------------
    // Configuration / Service State
    // -------------------------------------------------------------------------
    /// Required credential or environment value absent. Fails closed.
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Generation service is currently disabled")]
    ServiceDisabled,
}

pub type Result<T> = std::result::Result<T, RelayError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl RelayError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create an invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a provider-rejected error from a response status and body
    pub fn rejected(provider: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider,
            status,
            body: body.into(),
        }
    }

    /// HTTP status this error maps to at the endpoint boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::MissingSource(_) => 400,
            Self::RateLimited { .. } => 429,
            Self::ProviderRejected { .. }
            | Self::ProviderUnreachable { .. }
            | Self::GenerationFailed(_)
            | Self::NoAssetUrl => 502,
            Self::Timeout { .. } => 504,
            Self::ServiceDisabled => 503,
            Self::ConfigurationMissing(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) => 500,
        }
    }

    /// Whether this error represents a terminal job outcome.
    ///
    /// Terminal outcomes must release the submitting client's quota slot
    /// even though the overall operation failed.
    pub fn is_terminal_outcome(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed(_) | Self::Timeout { .. } | Self::NoAssetUrl
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
