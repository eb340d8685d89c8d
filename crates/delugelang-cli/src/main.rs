//! Deluge language client
//!
//! Thin host around delugelang-core: resolves the user's directories,
//! keeps the install progress visible, and launches the parser.

use clap::Parser;

mod cli;
mod commands;
mod host;

use cli::{Cli, Commands};
use host::Host;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "delugelang=debug,delugelang_core=debug"
    } else {
        "delugelang=warn,delugelang_core=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr; stdout is for command output and the parser.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(cli: Cli) -> anyhow::Result<i32> {
    let host = Host::load(cli.root)?;
    match cli.command.unwrap_or_default() {
        Commands::Ensure => {
            commands::ensure(&host).await?;
            Ok(0)
        }
        Commands::Update => {
            commands::update(&host).await?;
            Ok(0)
        }
        Commands::Run(args) => commands::run(&host, args.args).await,
        Commands::Status => {
            commands::status(&host).await?;
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_command(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
