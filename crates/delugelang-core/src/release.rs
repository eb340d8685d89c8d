//! Release metadata lookup
//!
//! Asks the release host for the latest published tag. Version lookup is
//! advisory: any failure here falls back to the configured default tag so
//! an offline or rate-limited host never blocks installation.

use crate::config::InstallerConfig;
use serde::Deserialize;
use tracing::{debug, warn};

/// Release metadata returned by the GitHub API
#[derive(Deserialize, Debug, Clone)]
pub struct GithubRelease {
    pub tag_name: String,
}

/// Latest published tag, or the configured default when lookup fails
pub async fn latest_release(client: &reqwest::Client, config: &InstallerConfig) -> String {
    match fetch_latest_tag(client, config).await {
        Ok(tag) => {
            debug!("latest release tag: {tag}");
            tag
        }
        Err(reason) => {
            warn!(
                "release lookup failed ({reason}), falling back to {}",
                config.default_version
            );
            config.default_version.clone()
        }
    }
}

async fn fetch_latest_tag(
    client: &reqwest::Client,
    config: &InstallerConfig,
) -> Result<String, String> {
    let mut request = client
        .get(&config.release_api_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "application/vnd.github.v3+json");

    // Use GITHUB_TOKEN if available (avoids rate limiting)
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        request = request.header("Authorization", format!("Bearer {token}"));
    }

    let response = request
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    if !response.status().is_success() {
        return Err(format!("release API returned {}", response.status()));
    }

    let release: GithubRelease = response
        .json()
        .await
        .map_err(|e| format!("invalid release payload: {e}"))?;

    let tag = release.tag_name.trim().to_string();
    if tag.is_empty() {
        return Err("release payload has an empty tag_name".to_string());
    }
    Ok(tag)
}
