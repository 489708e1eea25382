//! Configuration Management
//!
//! Optional persistent defaults for the CLI. Values given on the command line
//! or through the environment always win over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Solum API version
pub const DEFAULT_API_VERSION: &str = "1";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Solum endpoint, skips the catalog lookup
    #[serde(default)]
    pub solum_url: Option<String>,
    /// Keystone URL
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    /// GitHub API root used by `app create`
    #[serde(default)]
    pub github_api_url: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("solum").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file; a missing file is not an error
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Could not read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Effective API version (CLI/env > config > default)
    pub fn effective_api_version(&self, cli: Option<&str>) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.api_version.clone())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string())
    }

    /// Effective request timeout (CLI > config > default)
    pub fn effective_timeout(&self, cli: Option<u64>) -> Duration {
        Duration::from_secs(cli.or(self.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Effective GitHub API root (config > public GitHub)
    pub fn effective_github_api_url(&self) -> String {
        self.github_api_url
            .clone()
            .unwrap_or_else(|| crate::github::GITHUB_API_URL.to_string())
    }
}

/// First of the CLI/env value and the file value that is set and non-empty
pub fn layered(cli: Option<&str>, file: Option<&str>) -> Option<String> {
    cli.filter(|s| !s.is_empty())
        .or(file.filter(|s| !s.is_empty()))
        .map(|s| s.to_string())
}
