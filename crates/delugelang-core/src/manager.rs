//! Dependency orchestration
//!
//! Ties version resolution, the on-disk layout, and artifact downloads
//! together. `ensure_ready` is the call a host makes before spawning the
//! parser: it settles on a version, fills in whatever artifacts are
//! missing, and hands back the launch command. Only the parser artifact
//! is load-bearing; the runtime and docs install best-effort.

use crate::config::InstallerConfig;
use crate::error::{Error, Result};
use crate::events::{InstallEvent, InstallEvents};
use crate::fetch;
use crate::layout::InstallLayout;
use crate::platform::{artifact_specs, ArtifactKind, ArtifactSpec, Platform};
use crate::release;
use crate::retry::with_retry;
use crate::store::VersionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Command a host uses to spawn the installed parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub command: PathBuf,
    pub args: Vec<String>,
}

/// Session object coordinating one installation root
///
/// Owns its HTTP client and layout; hosts supply version persistence and
/// an optional progress listener. Safe to share behind an `Arc`.
pub struct DependencyManager {
    config: InstallerConfig,
    client: reqwest::Client,
    layout: InstallLayout,
    store: Arc<dyn VersionStore>,
    platform: Platform,
    events: InstallEvents,
}

impl DependencyManager {
    /// Build a manager for `root` with host-supplied version persistence
    pub fn new(
        config: InstallerConfig,
        root: impl Into<PathBuf>,
        store: Arc<dyn VersionStore>,
        events: InstallEvents,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            layout: InstallLayout::new(root),
            store,
            platform: Platform::current(),
            events,
        })
    }

    /// Override the detected platform, for cross-install tooling and tests
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Make sure the active version is installed and return how to spawn
    /// its parser
    pub async fn ensure_ready(&self) -> Result<LaunchCommand> {
        let version = self.resolve_version().await?;
        self.install_version(&version).await?;
        Ok(self.launch_command(&version))
    }

    /// Switch to the latest published release and install it
    ///
    /// Returns the tag that ended up active; the release lookup falls back
    /// to the default tag when the host is unreachable.
    pub async fn update_to_latest(&self) -> Result<String> {
        let version = release::latest_release(&self.client, &self.config).await;
        info!("updating to release {version}");
        self.store.set(&version).await?;
        self.install_version(&version).await?;
        Ok(version)
    }

    /// Launch command for the parser of an installed version
    pub fn launch_command(&self, version: &str) -> LaunchCommand {
        LaunchCommand {
            command: self
                .layout
                .artifact_path(version, self.platform.parser_name()),
            args: Vec::new(),
        }
    }

    /// Persisted version, or the default tag persisted on first run
    ///
    /// A blank persisted tag counts as absent; honoring one would collapse
    /// the version directory into the install root. A store read failure
    /// downgrades to the default selection; a store write failure aborts
    /// before anything is downloaded.
    async fn resolve_version(&self) -> Result<String> {
        let persisted = match self.store.get().await {
            Ok(version) => version,
            Err(e) => {
                warn!("version store read failed ({e}), selecting default");
                None
            }
        };
        match persisted {
            Some(version) if !version.trim().is_empty() => Ok(version),
            _ => {
                let version = self.config.default_version.clone();
                debug!("no persisted version, selecting default {version}");
                // Record the selection before any artifact is fetched so a
                // crashed install resumes against the same version.
                self.store.set(&version).await?;
                Ok(version)
            }
        }
    }

    /// Fill in missing artifacts for `version` and gate on the parser
    async fn install_version(&self, version: &str) -> Result<()> {
        self.events.emit(InstallEvent::VersionSelected {
            version: version.to_string(),
        });

        self.layout.ensure_dir(self.layout.root()).await?;
        let _lock = self.layout.acquire_lock(self.config.lock_wait()).await?;

        let version_dir = self.layout.version_dir(version);
        self.layout.ensure_dir(&version_dir).await?;
        debug!("ensuring release {version} at {}", version_dir.display());

        let mut parser_failure: Option<Error> = None;
        for spec in artifact_specs(self.platform) {
            match self.ensure_artifact(version, &spec).await {
                Ok(()) => {}
                Err(e) => {
                    self.events.emit(InstallEvent::ArtifactFailed {
                        artifact: spec.kind,
                        reason: e.to_string(),
                    });
                    if spec.kind == ArtifactKind::Parser {
                        parser_failure = Some(e);
                    } else {
                        warn!("{} artifact failed to install: {e}", spec.kind);
                    }
                }
            }
        }

        // Re-check on disk rather than trusting the loop above; the parser
        // is the one artifact startup cannot do without.
        let parser_path = self
            .layout
            .artifact_path(version, self.platform.parser_name());
        if !self.layout.is_file_present(&parser_path).await? {
            return Err(Error::Installation {
                path: parser_path,
                source: parser_failure.map(Box::new),
            });
        }

        self.events.emit(InstallEvent::Ready {
            version: version.to_string(),
        });
        Ok(())
    }

    /// Check one artifact and download it when missing
    async fn ensure_artifact(&self, version: &str, spec: &ArtifactSpec) -> Result<()> {
        let dest = self.layout.artifact_path(version, spec.file_name);
        if self.layout.is_file_present(&dest).await? {
            debug!("{} already present at {}", spec.kind, dest.display());
            self.events.emit(InstallEvent::ArtifactPresent {
                artifact: spec.kind,
            });
            return Ok(());
        }

        let url = self.config.artifact_url(version, spec.file_name);
        info!("downloading {} from {url}", spec.kind);
        self.events.emit(InstallEvent::Downloading {
            artifact: spec.kind,
        });
        with_retry(&self.config.retry, || {
            fetch::download(&self.client, &url, &dest, spec.executable)
        })
        .await?;
        self.events.emit(InstallEvent::Downloaded {
            artifact: spec.kind,
        });
        Ok(())
    }
}
