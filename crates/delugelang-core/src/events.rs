//! Install progress events
//!
//! Events that occur while dependencies are checked and downloaded.

use crate::platform::ArtifactKind;
use serde::Serialize;
use tokio::sync::mpsc;

/// Events during an install or update
#[derive(Debug, Clone, Serialize)]
pub enum InstallEvent {
    /// Version selected for installation
    VersionSelected { version: String },
    /// Artifact already on disk, download skipped
    ArtifactPresent { artifact: ArtifactKind },
    /// Artifact download started
    Downloading { artifact: ArtifactKind },
    /// Artifact download finished
    Downloaded { artifact: ArtifactKind },
    /// Artifact failed to install
    ArtifactFailed { artifact: ArtifactKind, reason: String },
    /// Install finished with the parser present
    Ready { version: String },
}

/// Handle the manager reports progress through
///
/// Every event is logged via tracing; a channel is attached when the host
/// wants to render progress itself.
#[derive(Clone)]
pub struct InstallEvents {
    tx: Option<mpsc::UnboundedSender<InstallEvent>>,
}

impl InstallEvents {
    /// Reporter that only logs
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Reporter paired with a receiver for the host to drain
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InstallEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Emit an event (logged via tracing, forwarded when a host listens)
    pub(crate) fn emit(&self, event: InstallEvent) {
        tracing::debug!("Install event: {:?}", event);
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

impl Default for InstallEvents {
    fn default() -> Self {
        Self::disabled()
    }
}
