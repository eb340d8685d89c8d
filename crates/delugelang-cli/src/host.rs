//! Host environment wiring
//!
//! Resolves where artifacts and persisted state live on this machine,
//! applies the optional config-file overlay, and assembles the dependency
//! manager the commands drive.

use anyhow::{Context, Result};
use delugelang_core::{
    DependencyManager, InstallEvents, InstallerConfig, JsonVersionStore, VersionStore,
};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const APP_DIR: &str = "delugelang";
const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.json";

/// Optional on-disk configuration at `<config dir>/delugelang/config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    /// Overrides where artifacts are installed
    root: Option<PathBuf>,
    /// Installer settings, passed through as-is
    installer: InstallerConfig,
}

/// Resolved host environment for the running user
#[derive(Debug)]
pub struct Host {
    pub root: PathBuf,
    pub state_path: PathBuf,
    pub config: InstallerConfig,
}

impl Host {
    /// Resolve directories and configuration
    ///
    /// `root_override` (the `--root` flag) wins over the config file,
    /// which wins over the platform data directory.
    pub fn load(root_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("could not determine the user configuration directory")?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .context("could not determine the user data directory")?
            .join(APP_DIR);
        Self::load_from(&config_dir, &data_dir, root_override)
    }

    fn load_from(
        config_dir: &Path,
        data_dir: &Path,
        root_override: Option<PathBuf>,
    ) -> Result<Self> {
        let file_config = read_file_config(&config_dir.join(CONFIG_FILE))?;
        // The layout creates the root non-recursively, so the default must
        // sit directly under the platform data directory.
        let root = root_override
            .or(file_config.root)
            .unwrap_or_else(|| data_dir.to_path_buf());

        Ok(Self {
            root,
            state_path: config_dir.join(STATE_FILE),
            config: file_config.installer,
        })
    }

    /// Version store backing this host
    pub fn store(&self) -> Arc<JsonVersionStore> {
        Arc::new(JsonVersionStore::new(&self.state_path))
    }

    /// Dependency manager wired to this host's directories
    pub fn manager(&self, events: InstallEvents) -> Result<DependencyManager> {
        let store = self.store() as Arc<dyn VersionStore>;
        DependencyManager::new(self.config.clone(), &self.root, store, events)
            .context("failed to initialize the dependency manager")
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!("loading configuration from {}", path.display());
            toml::from_str(&content)
                .with_context(|| format!("invalid configuration file {}", path.display()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => {
            Err(e).with_context(|| format!("failed to read configuration {}", path.display()))
        }
    }
}
