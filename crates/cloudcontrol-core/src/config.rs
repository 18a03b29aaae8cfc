//! Configuration types for CloudControl tooling
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Per-user settings locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the connection store and the protection key
    pub settings_dir: PathBuf,
}

impl Settings {
    /// Name of the settings directory under the home directory
    pub const SETTINGS_DIR_NAME: &'static str = ".mcp";

    /// File name of the connection store
    pub const CONNECTION_SETTINGS_FILE: &'static str = "connection-settings.json";

    /// File name of the credential protection master key
    pub const PROTECTION_KEY_FILE: &'static str = "credential-protection.key";

    /// Resolve settings from the environment
    ///
    /// `HOME` wins when set and non-empty; otherwise the platform home
    /// directory is used.
    pub fn from_env() -> Result<Self> {
        let home = std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::config("Unable to determine the user's home directory"))?;

        Ok(Self::with_home(home))
    }

    /// Settings rooted at the given home directory
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        Self {
            settings_dir: home.as_ref().join(Self::SETTINGS_DIR_NAME),
        }
    }

    /// Path of the connection store
    pub fn connection_settings_file(&self) -> PathBuf {
        self.settings_dir.join(Self::CONNECTION_SETTINGS_FILE)
    }

    /// Path of the protection master key
    pub fn protection_key_file(&self) -> PathBuf {
        self.settings_dir.join(Self::PROTECTION_KEY_FILE)
    }
}

/// Resource-state poller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay between fetches (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// How long a resource that has never been seen may stay not-found
    /// before polling gives up (in milliseconds)
    #[serde(default = "default_not_found_grace_ms")]
    pub not_found_grace_ms: u64,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn not_found_grace(&self) -> Duration {
        Duration::from_millis(self.not_found_grace_ms)
    }

    /// Validate the poller configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::config("Poll interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            not_found_grace_ms: default_not_found_grace_ms(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL override; when unset the URL is derived from the region
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    /// Base URL of the API endpoint for a region
    ///
    /// Always ends with `/` so relative paths can be joined onto it.
    pub fn base_url_for(&self, region: &str) -> String {
        match &self.base_url {
            Some(url) if url.ends_with('/') => url.clone(),
            Some(url) => format!("{}/", url),
            None => format!("https://api-{}.dimensiondata.com/", region.to_lowercase()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the client configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::config("HTTP timeout must be > 0"));
        }
        if let Some(url) = &self.base_url
            && url.is_empty()
        {
            return Err(Error::config("Base URL override cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3_000
}

fn default_not_found_grace_ms() -> u64 {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("cloudcontrol/{}", env!("CARGO_PKG_VERSION"))
}
