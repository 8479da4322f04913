//! Application configuration management.
//!
//! Configuration is stored at `~/.config/bg1/config.json`. A few fields can
//! be overridden from the environment (or a `.env` file loaded by the
//! binary): `BG1_LOCATION`, `BG1_API_BASE_URL`, `BG1_CREDENTIAL_BACKEND`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Location;
use crate::watchdog::SYNC_TIMEOUT;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "bg1";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_LOCATION: &str = "BG1_LOCATION";
pub const ENV_API_BASE_URL: &str = "BG1_API_BASE_URL";
pub const ENV_CREDENTIAL_BACKEND: &str = "BG1_CREDENTIAL_BACKEND";

/// Where the credential is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

impl CredentialBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "keyring" | "keychain" => Some(Self::Keyring),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location: Location,
    /// Overrides the location's default queue service
    pub api_base_url: Option<String>,
    pub credential_backend: CredentialBackend,
    pub sync_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: Location::default(),
            api_base_url: None,
            credential_backend: CredentialBackend::default(),
            sync_timeout_secs: SYNC_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Load the config file and apply environment overrides.
    ///
    /// Never fails: an unreadable file falls back to defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path().and_then(|p| Self::load_from(&p)) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Using default configuration");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(location) = lookup(ENV_LOCATION).filter(|s| !s.trim().is_empty()) {
            self.location = Location::new(location.trim());
        }
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|s| !s.trim().is_empty()) {
            self.api_base_url = Some(url.trim().to_string());
        }
        if let Some(backend) = lookup(ENV_CREDENTIAL_BACKEND) {
            match CredentialBackend::parse(&backend) {
                Some(backend) => self.credential_backend = backend,
                None => warn!(value = %backend, "Unknown credential backend, keeping {:?}", self.credential_backend),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.location.default_api_base_url())
    }

    pub fn sync_timeout(&self) -> Duration {
        if self.sync_timeout_secs == 0 {
            SYNC_TIMEOUT
        } else {
            Duration::from_secs(self.sync_timeout_secs)
        }
    }
}
