//! Platform-specific artifact names for the parser release contract
//!
//! Every release publishes one runtime binary and one parser binary per
//! operating system, plus a shared docs payload. Mapping the running OS
//! to those names is pure and side-effect free.

use serde::Serialize;
use std::env::consts;
use std::fmt;

/// Role an artifact plays within a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Runtime,
    Parser,
    Docs,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Runtime => "runtime",
            ArtifactKind::Parser => "parser",
            ArtifactKind::Docs => "docs",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operating systems the release contract distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the platform of the running process
    ///
    /// Unrecognized operating systems take the Linux artifact set, so the
    /// resolver never fails.
    pub fn current() -> Self {
        match consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            _ => Platform::Linux,
        }
    }

    /// Whether downloaded binaries need the executable permission bit
    pub fn needs_executable_bit(&self) -> bool {
        !matches!(self, Platform::Windows)
    }

    /// Release file name of the runtime binary
    pub fn runtime_name(&self) -> &'static str {
        match self {
            Platform::Windows => "runtime-win.aot",
            Platform::MacOs => "runtime-mac.bin",
            Platform::Linux => "runtime-linux.bin",
        }
    }

    /// Release file name of the parser binary
    pub fn parser_name(&self) -> &'static str {
        match self {
            Platform::Windows => "parser-win.aot",
            Platform::MacOs => "parser-mac.bin",
            Platform::Linux => "parser-linux.bin",
        }
    }

    /// Release file name of the docs payload, identical on every platform
    pub fn docs_name(&self) -> &'static str {
        "docs.json"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        };
        write!(f, "{name}")
    }
}

/// One platform-specific artifact of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub kind: ArtifactKind,
    pub file_name: &'static str,
    /// Set the executable bit after download
    pub executable: bool,
}

/// The three artifacts that constitute one installed version
pub fn artifact_specs(platform: Platform) -> [ArtifactSpec; 3] {
    let executable = platform.needs_executable_bit();
    [
        ArtifactSpec {
            kind: ArtifactKind::Runtime,
            file_name: platform.runtime_name(),
            executable,
        },
        ArtifactSpec {
            kind: ArtifactKind::Parser,
            file_name: platform.parser_name(),
            executable,
        },
        ArtifactSpec {
            kind: ArtifactKind::Docs,
            file_name: platform.docs_name(),
            executable,
        },
    ]
}
