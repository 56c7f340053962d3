//! Configuration management for Parley.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::BackendConfig;
use crate::error::{ParleyError, Result};
use crate::session::DEFAULT_MAX_TURNS;

/// Top-level Parley configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Model backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Session store settings.
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin (browser front-ends served from elsewhere).
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Turns kept per session.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl ParleyConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::Config(format!("Failed to read config: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| ParleyError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ParleyError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ParleyConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.backend.model, "phi3:latest");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.session.max_turns, 50);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nmodel = \"llama3.2\"\n").unwrap();

        let config = ParleyConfig::load(&path).unwrap();
        assert_eq!(config.backend.model, "llama3.2");
        assert_eq!(config.backend.api_base, "http://localhost:11434");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ParleyConfig::default();
        config.server.port = 9100;
        config.backend.fallback_models = vec!["llama3.2".into()];
        config.save(&path).unwrap();

        let loaded = ParleyConfig::load(&path).unwrap();
        assert_eq!(loaded.server.port, 9100);
        assert_eq!(loaded.backend.fallback_models, ["llama3.2"]);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = ParleyConfig::load(&path).unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }
}
