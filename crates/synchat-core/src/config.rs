//! Configuration loading
//!
//! Reads `{config_dir}/synchat/config.toml`; every field has a default so a
//! missing file just means defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

const APP_DIR: &str = "synchat";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the SynGo backend.
    pub base_url: String,
    /// Streaming timeout in seconds; a session that has not reached a
    /// terminal state by then is forcibly terminated.
    pub stream_timeout_secs: u64,
    /// Override for the credential file location.
    pub token_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            stream_timeout_secs: 30,
            token_path: None,
        }
    }
}

impl Config {
    /// Load from the user config dir, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_file() else {
            debug!("no config dir available, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!("no config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Resolved credential file path.
    pub fn credential_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.token_path {
            return Some(path.clone());
        }
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("credentials.json"))
    }

    fn config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: Config = toml::from_str("base_url = \"https://syngo.example\"").unwrap();
        assert_eq!(config.base_url, "https://syngo.example");
        assert_eq!(config.stream_timeout_secs, 30);
        assert!(config.token_path.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
    }
}
