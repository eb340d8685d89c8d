//! Command implementations for the Deluge client CLI

use crate::host::Host;
use anyhow::{Context, Result};
use delugelang_core::{
    artifact_specs, DependencyManager, InstallEvent, InstallEvents, LaunchCommand, VersionStore,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Download any missing artifacts for the active version
pub async fn ensure(host: &Host) -> Result<()> {
    let launch = ensure_ready(host).await?;
    println!("Parser ready at {}", launch.command.display());
    Ok(())
}

/// Switch to the latest published release and install it
pub async fn update(host: &Host) -> Result<()> {
    let (manager, printer) = manager_with_progress(host)?;
    let result = manager.update_to_latest().await;
    drop(manager);
    let _ = printer.await;
    let version = result?;
    println!("Updated to {version}");
    Ok(())
}

/// Ensure dependencies are installed, then run the parser with stdio
/// inherited
pub async fn run(host: &Host, args: Vec<String>) -> Result<i32> {
    let launch = ensure_ready(host).await?;
    debug!("spawning parser {}", launch.command.display());

    let status = tokio::process::Command::new(&launch.command)
        .args(&launch.args)
        .args(&args)
        .status()
        .await
        .with_context(|| format!("failed to spawn parser {}", launch.command.display()))?;

    Ok(status.code().unwrap_or(1))
}

/// Show the active version and which artifacts are installed
pub async fn status(host: &Host) -> Result<()> {
    let store = host.store();
    match store.get().await? {
        None => println!(
            "No version persisted yet; the next run will install {}",
            host.config.default_version
        ),
        Some(version) => {
            println!("Active version: {version}");
            println!("Install root: {}", host.root.display());
            let manager = host.manager(InstallEvents::disabled())?;
            let layout = manager.layout();
            for spec in artifact_specs(manager.platform()) {
                let path = layout.artifact_path(&version, spec.file_name);
                let present = layout.is_file_present(&path).await?;
                let state = if present { "installed" } else { "missing" };
                println!("  {:<8} {state}  {}", spec.kind.as_str(), path.display());
            }
        }
    }
    Ok(())
}

async fn ensure_ready(host: &Host) -> Result<LaunchCommand> {
    let (manager, printer) = manager_with_progress(host)?;
    let result = manager.ensure_ready().await;
    drop(manager);
    let _ = printer.await;
    Ok(result?)
}

fn manager_with_progress(host: &Host) -> Result<(DependencyManager, JoinHandle<()>)> {
    let (events, rx) = InstallEvents::channel();
    let printer = spawn_progress_printer(rx);
    let manager = host.manager(events)?;
    Ok((manager, printer))
}

/// Render install events as console lines until the manager is dropped
fn spawn_progress_printer(mut rx: mpsc::UnboundedReceiver<InstallEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                InstallEvent::VersionSelected { version } => {
                    println!("Using release {version}");
                }
                InstallEvent::Downloading { artifact } => {
                    println!("Downloading {artifact}...");
                }
                InstallEvent::Downloaded { artifact } => {
                    println!("Downloaded {artifact}");
                }
                InstallEvent::ArtifactFailed { artifact, reason } => {
                    eprintln!("Warning: {artifact} failed to install: {reason}");
                }
                InstallEvent::ArtifactPresent { .. } => {}
                InstallEvent::Ready { version } => {
                    println!("All dependencies present for {version}");
                }
            }
        }
    })
}
