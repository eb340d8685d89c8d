//! CLI definitions using clap derive API

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deluge language client
///
/// Installs the parser, runtime, and docs artifacts for the active
/// release and launches the parser.
#[derive(Parser, Debug)]
#[command(name = "delugelang", version, about = "Deluge language client")]
pub struct Cli {
    /// Installation root for downloaded artifacts (defaults to the user
    /// data directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download any missing artifacts for the active version
    Ensure,

    /// Switch to the latest published release and install it
    Update,

    /// Ensure dependencies are installed, then run the parser
    Run(RunArgs),

    /// Show the active version and which artifacts are installed
    Status,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run(RunArgs::default())
    }
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Arguments passed through to the parser
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
