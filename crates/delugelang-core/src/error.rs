//! Error types for the installer core
//!
//! Typed errors at the library seam; the CLI turns them into user-facing
//! messages at the edge.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while installing or resolving parser dependencies
#[derive(Error, Debug)]
pub enum Error {
    /// Version-store read or write failed
    #[error("version store error: {message}")]
    Config { message: String },

    /// Filesystem operation failed for a reason other than "not found"
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact transfer failed or left an incomplete body
    #[error("failed to download {url}: {reason}")]
    Download {
        url: String,
        reason: String,
        /// Transient failures (transport, timeout, 5xx) are worth retrying
        retryable: bool,
    },

    /// Parser artifact missing after the download phase - fatal to startup
    #[error("parser not installed: expected artifact at {}", path.display())]
    Installation {
        path: PathBuf,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Another install holds the advisory lock for this root
    #[error("installation root {} is locked by another install", root.display())]
    Locked { root: PathBuf },
}

impl Error {
    /// Version-store failure with a formatted message
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Filesystem failure tagged with the path it happened at
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Download failure for `url`; `retryable` marks transient causes
    pub fn download(url: impl Into<String>, reason: impl Into<String>, retryable: bool) -> Self {
        Error::Download {
            url: url.into(),
            reason: reason.into(),
            retryable,
        }
    }
}

/// Result type used throughout the installer core
pub type Result<T> = std::result::Result<T, Error>;
