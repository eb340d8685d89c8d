//! Deluge language client core
//!
//! Makes sure the versioned parser, runtime, and docs artifacts exist on
//! disk before a host spawns the parser. Missing pieces are downloaded
//! from the release host, the active version is persisted through a
//! host-supplied store, and the caller gets back the command to launch
//! the installed parser.

pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod layout;
pub mod manager;
pub mod platform;
pub mod release;
pub mod retry;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{InstallerConfig, DEFAULT_VERSION};
pub use error::{Error, Result};
pub use events::{InstallEvent, InstallEvents};
pub use layout::InstallLayout;
pub use manager::{DependencyManager, LaunchCommand};
pub use platform::{artifact_specs, ArtifactKind, ArtifactSpec, Platform};
pub use retry::RetryConfig;
pub use store::{JsonVersionStore, VersionStore};
