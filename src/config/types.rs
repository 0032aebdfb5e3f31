//! Configuration Types
//!
//! All configuration structures with sensible defaults. Provider base URLs
//! are deliberately NOT configurable; each provider pins its own endpoint.

use serde::{Deserialize, Serialize};

use crate::constants::{quota as quota_constants, server as server_constants};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Per-client quota settings
    pub quota: QuotaConfig,

    /// Generation provider credentials
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            quota: QuotaConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RelayError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.quota.max_concurrent_generations == 0 {
            return Err(crate::types::RelayError::Config(
                "quota.max_concurrent_generations must be greater than 0".to_string(),
            ));
        }

        if self.quota.reset_interval_secs == 0 {
            return Err(crate::types::RelayError::Config(
                "quota.reset_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(crate::types::RelayError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,

    /// Feature-disable flag: when set, every endpoint answers with a fixed
    /// "service disabled" response before any provider call or quota
    /// mutation occurs.
    pub disabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: server_constants::DEFAULT_PORT,
            disabled: false,
        }
    }
}

// =============================================================================
// Quota Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Concurrency ceiling per client bucket
    pub max_concurrent_generations: u32,

    /// Cadence of the full quota-map reset (seconds)
    pub reset_interval_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_concurrent_generations: quota_constants::MAX_CONCURRENT_GENERATIONS,
            reset_interval_secs: quota_constants::RESET_INTERVAL_SECS,
        }
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Credentials for the external generation providers.
///
/// Keys are never serialized back out and are redacted in debug output.
/// Each provider converts its key to `SecretString` internally; absence is
/// only an error at call time, where the endpoint fails closed.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    /// API key for the text-to-3D provider
    #[serde(skip_serializing)]
    pub mesh_api_key: Option<String>,

    /// API key for the skybox provider
    #[serde(skip_serializing)]
    pub skybox_api_key: Option<String>,
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("mesh_api_key", &self.mesh_api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "skybox_api_key",
                &self.skybox_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
