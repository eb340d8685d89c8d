//! Installer configuration and release-host endpoints
//!
//! Defaults reproduce the published release layout; every endpoint and
//! timeout can be overridden by the host, which is also what the tests
//! rely on to point the installer at a local stub server.

use crate::retry::RetryConfig;
use serde::Deserialize;
use std::time::Duration;

/// Tag installed when nothing is persisted and the release lookup fails
pub const DEFAULT_VERSION: &str = "v0.04-alpha";

const RELEASE_BASE_URL: &str =
    "https://github.com/YossiAshkenazi/Deluge-Language-Parser/releases/download/";
const RELEASE_API_URL: &str =
    "https://api.github.com/repos/GuruDhanush/Deluge-Language-Parser/releases/latest";
const USER_AGENT: &str = "Deluge-Language-Parser";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOCK_WAIT_SECS: u64 = 30;

/// Configuration for the dependency manager
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Base URL artifacts are fetched from, as `<base><tag>/<file>`
    pub release_base_url: String,
    /// Release-metadata endpoint queried for the latest tag
    pub release_api_url: String,
    /// Tag selected when no version is persisted or the lookup fails
    pub default_version: String,
    /// Client identification sent on every release-host request
    pub user_agent: String,
    /// Total per-request timeout in seconds, covering the whole body
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// How long to wait for the install lock before giving up, in seconds
    pub lock_wait_secs: u64,
    /// Retry policy for artifact downloads
    pub retry: RetryConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            release_base_url: RELEASE_BASE_URL.to_string(),
            release_api_url: RELEASE_API_URL.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            user_agent: USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            lock_wait_secs: DEFAULT_LOCK_WAIT_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl InstallerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(self.lock_wait_secs)
    }

    /// Download URL for one artifact of one release
    pub fn artifact_url(&self, version: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.release_base_url.trim_end_matches('/'),
            version,
            file_name
        )
    }
}
