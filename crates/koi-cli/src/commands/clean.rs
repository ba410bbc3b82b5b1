//! Implementation of the `koi clean` command.

use std::fs;
use std::path::Path;

use tracing::info;

use koi_bootstrap::{BootstrapError, OrchestratorConfig, Topology};

/// Generated files removed from each node directory. Local `.env` files
/// are kept; they may hold populated secrets.
const NODE_FILES: &[&str] = &["config.yaml", "Dockerfile"];

/// Generated state directories removed from each node directory.
const NODE_DIRS: &[&str] = &[".venv", ".koi"];

/// Remove everything the bootstrapper generated, leaving the cloned
/// sources and the secret store in place.
pub fn run() -> Result<(), BootstrapError> {
    let config = OrchestratorConfig::load()?;
    let topology = Topology::standard();

    for spec in topology.nodes() {
        let repo_dir = config.repo_dir(&spec.name);
        if !repo_dir.exists() {
            continue;
        }
        for file in NODE_FILES {
            remove_file(&repo_dir.join(file))?;
        }
        for dir in NODE_DIRS {
            remove_dir(&repo_dir.join(dir))?;
        }
    }

    remove_file(&config.manifest_path())?;

    println!("Cleanup complete.");
    Ok(())
}

fn remove_file(path: &Path) -> Result<(), BootstrapError> {
    if path.exists() {
        fs::remove_file(path)?;
        info!(path = %path.display(), "removed");
    }
    Ok(())
}

fn remove_dir(path: &Path) -> Result<(), BootstrapError> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        info!(path = %path.display(), "removed");
    }
    Ok(())
}
