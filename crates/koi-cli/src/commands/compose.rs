//! Implementation of the `koi docker-up` and `koi docker-down` commands.

use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;

use koi_bootstrap::{BootstrapError, OrchestratorConfig};

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error(
        "deployment manifest not found at {}; run 'koi docker-setup' first",
        .0.display()
    )]
    ManifestMissing(PathBuf),

    #[error("docker compose {verb} failed with status {status}")]
    ComposeFailed { verb: &'static str, status: i32 },

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Start all container services in detached mode.
pub async fn up() -> Result<(), ComposeError> {
    compose(&["up", "-d"], "up").await?;
    println!("All services started. Stop them with: koi docker-down");
    Ok(())
}

/// Stop all container services.
pub async fn down() -> Result<(), ComposeError> {
    compose(&["down"], "down").await?;
    println!("All services stopped.");
    Ok(())
}

async fn compose(args: &[&str], verb: &'static str) -> Result<(), ComposeError> {
    let config = OrchestratorConfig::load()?;
    let manifest = config.manifest_path();
    if !manifest.exists() {
        return Err(ComposeError::ManifestMissing(manifest));
    }

    let status = Command::new("docker")
        .arg("compose")
        .args(args)
        .current_dir(&config.workspace.root)
        .status()
        .await?;

    if !status.success() {
        return Err(ComposeError::ComposeFailed {
            verb,
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
