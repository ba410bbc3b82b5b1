//! Implementation of the `koi run` command.

use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use tracing::info;

use koi_bootstrap::provision::node_interpreter;
use koi_bootstrap::{BootstrapError, OrchestratorConfig, Topology};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("unknown node '{0}'; use a repository or service name")]
    UnknownNode(String),

    #[error(
        "no virtual environment found at {}; run 'koi setup' first",
        .0.display()
    )]
    NotProvisioned(PathBuf),

    #[error("node exited with status {0}")]
    NodeFailed(i32),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run a single node in the foreground, through its provisioned
/// interpreter.
pub async fn run(node: &str) -> Result<(), RunError> {
    let config = OrchestratorConfig::load()?;
    let topology = Topology::standard();

    let spec = topology
        .find(node)
        .ok_or_else(|| RunError::UnknownNode(node.to_owned()))?;
    let repo_dir = config.repo_dir(&spec.name);

    let interpreter =
        node_interpreter(&repo_dir).ok_or_else(|| RunError::NotProvisioned(repo_dir.clone()))?;

    info!(node = %spec.name, module = %spec.module, "starting node");

    let status = Command::new(interpreter)
        .args(["-m", spec.module])
        .current_dir(&repo_dir)
        .status()
        .await?;

    if !status.success() {
        return Err(RunError::NodeFailed(status.code().unwrap_or(-1)));
    }
    Ok(())
}
