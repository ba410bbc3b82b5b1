//! Runtime provisioning for local mode: an isolated interpreter
//! environment per node, with the node's declared dependencies installed.
//!
//! The bootstrapper treats this step as opaque. Failures are fatal for
//! the node being provisioned but never touch configuration already
//! written for other nodes.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{BootstrapError, BootstrapResult};
use crate::types::NodeName;

/// Directory name of a node's virtual environment.
pub const VENV_DIR: &str = ".venv";

/// Dependency declaration the installer looks for.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Locate an executable inside a venv, checking both POSIX and Windows
/// layouts.
#[must_use]
pub fn venv_exec_path(venv_dir: &Path, executable: &str) -> Option<PathBuf> {
    for sub in ["bin", "Scripts"] {
        let path = venv_dir.join(sub).join(executable);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// The interpreter of a node's venv, if the node has been provisioned.
#[must_use]
pub fn node_interpreter(repo_dir: &Path) -> Option<PathBuf> {
    let venv = repo_dir.join(VENV_DIR);
    venv_exec_path(&venv, "python").or_else(|| venv_exec_path(&venv, "python3"))
}

/// Ensure `node`'s execution environment exists under `repo_dir` and its
/// declared dependencies are installed.
pub async fn provision(node: &NodeName, repo_dir: &Path) -> BootstrapResult<()> {
    let venv = repo_dir.join(VENV_DIR);

    if venv.exists() {
        debug!(node = %node, "virtual environment already exists");
    } else {
        info!(node = %node, "creating virtual environment");
        run_step(node, repo_dir, "python3", &["-m", "venv", VENV_DIR]).await?;
    }

    let interpreter = node_interpreter(repo_dir).ok_or_else(|| BootstrapError::Provision {
        node: node.to_string(),
        message: "no interpreter found in virtual environment".to_owned(),
    })?;

    let requirements = repo_dir.join(REQUIREMENTS_FILE);
    if !requirements.exists() {
        debug!(node = %node, "no requirements file, skipping install");
        return Ok(());
    }

    info!(node = %node, "installing dependencies");
    run_step(
        node,
        repo_dir,
        &interpreter.display().to_string(),
        &["-m", "pip", "install", "-r", REQUIREMENTS_FILE],
    )
    .await?;

    Ok(())
}

/// Run one provisioning command, mapping any failure into a node-local
/// provisioning error.
async fn run_step(
    node: &NodeName,
    cwd: &Path,
    program: &str,
    args: &[&str],
) -> BootstrapResult<()> {
    debug!(node = %node, program = %program, args = ?args, "running provisioning step");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| BootstrapError::Provision {
            node: node.to_string(),
            message: format!("failed to run {program}: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BootstrapError::Provision {
            node: node.to_string(),
            message: format!("{program} {} failed: {}", args.join(" "), stderr.trim()),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn venv_exec_path_checks_posix_layout() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("python"), "").unwrap();

        assert_eq!(
            venv_exec_path(dir.path(), "python"),
            Some(bin.join("python"))
        );
        assert_eq!(venv_exec_path(dir.path(), "pip"), None);
    }

    #[test]
    fn venv_exec_path_checks_windows_layout() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("Scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join("python"), "").unwrap();

        assert!(venv_exec_path(dir.path(), "python").is_some());
    }

    #[test]
    fn node_interpreter_requires_provisioned_venv() {
        let dir = tempfile::tempdir().unwrap();
        assert!(node_interpreter(dir.path()).is_none());

        let bin = dir.path().join(VENV_DIR).join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("python3"), "").unwrap();
        assert!(node_interpreter(dir.path()).is_some());
    }
}
