//! Configuration Management
//!
//! Client settings, with optional persistence under the user config directory
//! and environment overrides for the endpoint and token.

use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Base URL used when none is configured
pub const DEFAULT_ENDPOINT: &str = "https://api.resclient.io/v1/";

/// Watch loops never poll faster than this
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_ENDPOINT: &str = "RESCLIENT_ENDPOINT";
pub const ENV_TOKEN: &str = "RESCLIENT_TOKEN";

/// Client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token. Never written back to disk.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
    #[serde(default = "default_watch_timeout_ms")]
    pub watch_timeout_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    format!("resclient/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

fn default_watch_interval_ms() -> u64 {
    DEFAULT_WATCH_INTERVAL.as_millis() as u64
}

fn default_watch_timeout_ms() -> u64 {
    DEFAULT_WATCH_TIMEOUT.as_millis() as u64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            user_agent: default_user_agent(),
            request_timeout_ms: default_request_timeout_ms(),
            watch_interval_ms: default_watch_interval_ms(),
            watch_timeout_ms: default_watch_timeout_ms(),
        }
    }
}

// Security: keep the token out of logs and panic messages
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("watch_interval_ms", &self.watch_interval_ms)
            .field("watch_timeout_ms", &self.watch_timeout_ms)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn with_watch(mut self, interval: Duration, timeout: Duration) -> Self {
        self.watch_interval_ms = interval.as_millis() as u64;
        self.watch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    pub fn watch_timeout(&self) -> Duration {
        Duration::from_millis(self.watch_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parsed endpoint. A trailing slash is added so relative paths join under it.
    pub fn endpoint_url(&self) -> Result<Url, Error> {
        let mut raw = self.endpoint.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", self.endpoint, e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("endpoint '{}' cannot be a base URL", self.endpoint)));
        }
        Ok(url)
    }

    /// Check the endpoint and watch bounds.
    pub fn validate(&self) -> Result<(), Error> {
        self.endpoint_url()?;
        let interval = self.watch_interval();
        if interval < MIN_WATCH_INTERVAL {
            return Err(Error::Config(format!(
                "watch interval {:?} is below the minimum of {:?}",
                interval, MIN_WATCH_INTERVAL
            )));
        }
        if self.watch_timeout() <= interval {
            return Err(Error::Config(format!(
                "watch timeout {:?} must exceed the watch interval {:?}",
                self.watch_timeout(),
                interval
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("resclient").join("config.json"))
    }

    /// Load configuration from the default path, then apply environment overrides.
    /// Missing or unreadable files fall back to defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            }),
            _ => Self::default(),
        };
        config.apply_env();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Override endpoint and token from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.trim().is_empty() {
                self.token = Some(token);
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }
}
