//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Config file (genrelay.toml, or an explicit path)
//! 3. Environment variables (GENRELAY_* prefix, `__` as section separator)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::types::{RelayError, Result};

/// Environment variable prefix, e.g. `GENRELAY_SERVER__PORT=9090`
const ENV_PREFIX: &str = "GENRELAY_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → config file → env vars
    pub fn load() -> Result<Config> {
        Self::load_with_file(None)
    }

    /// Load configuration, preferring an explicitly named file when given
    pub fn load_with_file(path: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);
        if file.exists() {
            debug!("Loading config from: {}", file.display());
            figment = figment.merge(Toml::file(&file));
        } else if path.is_some() {
            return Err(RelayError::Config(format!(
                "Config file not found: {}",
                file.display()
            )));
        }

        // Double underscore separates sections from keys so key names may
        // themselves contain underscores (GENRELAY_QUOTA__RESET_INTERVAL_SECS)
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| RelayError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Path checked for a config file when none is given explicitly
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("genrelay.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = ConfigLoader::load_with_file(Some(Path::new("/nonexistent/genrelay.toml")));
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genrelay.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9191

[quota]
max_concurrent_generations = 4
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_with_file(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.quota.max_concurrent_generations, 4);
        // Untouched sections keep their defaults
        assert_eq!(config.quota.reset_interval_secs, 600);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genrelay.toml");
        std::fs::write(&path, "[quota]\nmax_concurrent_generations = 0\n").unwrap();

        let result = ConfigLoader::load_with_file(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_api_keys_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genrelay.toml");
        std::fs::write(&path, "[providers]\nmesh_api_key = \"sk-test\"\n").unwrap();

        let config = ConfigLoader::load_with_file(Some(&path)).unwrap();
        assert_eq!(config.providers.mesh_api_key.as_deref(), Some("sk-test"));
        assert!(config.providers.skybox_api_key.is_none());
    }
}
