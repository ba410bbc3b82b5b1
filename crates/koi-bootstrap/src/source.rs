//! Repository resolution: making sure each node's source tree exists
//! locally at the requested revision.
//!
//! Revision misses are survivable (fall back to the default branch, or
//! keep the existing checkout) and surfaced as warnings; a total
//! acquisition failure is fatal and stops the node's row.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{BootstrapError, BootstrapResult};
use crate::types::NodeName;

/// Which revision the resolver actually obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBranch {
    /// The requested revision.
    Requested,
    /// The repository's default revision; the requested one was missing
    /// upstream.
    DefaultFallback,
    /// Whatever the existing checkout already had; the requested revision
    /// could not be switched to.
    ExistingState,
}

/// A confirmed local source tree.
#[derive(Debug)]
pub struct ResolvedRepo {
    /// Path of the working copy.
    pub path: PathBuf,
    /// Which revision was obtained.
    pub branch: ResolvedBranch,
}

/// Resolves node repositories against a git remote.
#[derive(Debug, Clone)]
pub struct RepoResolver {
    remote_base: String,
}

impl RepoResolver {
    /// Create a resolver cloning from `remote_base` (the repository name
    /// is appended to it).
    #[must_use]
    pub fn new(remote_base: impl Into<String>) -> Self {
        Self {
            remote_base: remote_base.into(),
        }
    }

    /// Ensure `name`'s working copy exists at `dest`, at `branch` when
    /// possible.
    ///
    /// A fresh clone that fails for the requested branch retries against
    /// the default branch; only a second failure is fatal. An existing
    /// checkout is fetched and switched if the branch exists remotely,
    /// and left untouched (with a warning) otherwise.
    pub async fn resolve(
        &self,
        name: &NodeName,
        branch: &str,
        dest: &Path,
    ) -> BootstrapResult<ResolvedRepo> {
        if dest.exists() {
            self.update_existing(name, branch, dest).await
        } else {
            self.clone_fresh(name, branch, dest).await
        }
    }

    fn remote_url(&self, name: &NodeName) -> String {
        format!("{}/{}", self.remote_base.trim_end_matches('/'), name)
    }

    async fn clone_fresh(
        &self,
        name: &NodeName,
        branch: &str,
        dest: &Path,
    ) -> BootstrapResult<ResolvedRepo> {
        let url = self.remote_url(name);
        let dest_arg = dest.display().to_string();

        info!(repo = %name, branch = %branch, "cloning repository");
        let attempt = run_git_in(
            None,
            &["clone", "-b", branch, url.as_str(), dest_arg.as_str()],
        )
        .await?;

        if attempt.success {
            return Ok(ResolvedRepo {
                path: dest.to_path_buf(),
                branch: ResolvedBranch::Requested,
            });
        }

        warn!(
            repo = %name,
            branch = %branch,
            "branch not available upstream, falling back to default branch"
        );

        let fallback = run_git_in(None, &["clone", url.as_str(), dest_arg.as_str()]).await?;
        if fallback.success {
            info!(repo = %name, "cloned default branch");
            return Ok(ResolvedRepo {
                path: dest.to_path_buf(),
                branch: ResolvedBranch::DefaultFallback,
            });
        }

        Err(BootstrapError::RepoUnavailable {
            repo: name.to_string(),
            message: fallback.stderr,
        })
    }

    async fn update_existing(
        &self,
        name: &NodeName,
        branch: &str,
        dest: &Path,
    ) -> BootstrapResult<ResolvedRepo> {
        debug!(repo = %name, "repository already present, refreshing");

        let fetch = run_git_in(Some(dest), &["fetch"]).await?;
        if !fetch.success {
            warn!(repo = %name, error = %fetch.stderr.trim(), "fetch failed, using existing state");
            return Ok(ResolvedRepo {
                path: dest.to_path_buf(),
                branch: ResolvedBranch::ExistingState,
            });
        }

        if branch_exists_remotely(dest, branch).await? {
            let checkout = run_git_in(Some(dest), &["checkout", branch]).await?;
            if checkout.success {
                info!(repo = %name, branch = %branch, "checked out branch");
                return Ok(ResolvedRepo {
                    path: dest.to_path_buf(),
                    branch: ResolvedBranch::Requested,
                });
            }
            warn!(
                repo = %name,
                branch = %branch,
                error = %checkout.stderr.trim(),
                "checkout failed, using existing state"
            );
        } else {
            warn!(repo = %name, branch = %branch, "branch does not exist on remote");
        }

        Ok(ResolvedRepo {
            path: dest.to_path_buf(),
            branch: ResolvedBranch::ExistingState,
        })
    }
}

/// Probe whether `branch` exists on the checkout's `origin` remote.
async fn branch_exists_remotely(repo_dir: &Path, branch: &str) -> BootstrapResult<bool> {
    let probe = run_git_in(Some(repo_dir), &["ls-remote", "--heads", "origin", branch]).await?;
    if !probe.success {
        return Ok(false);
    }
    let suffix = format!("refs/heads/{branch}");
    Ok(probe.stdout.lines().any(|line| line.trim_end().ends_with(&suffix)))
}

/// Outcome of one git invocation.
struct GitOutcome {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Run git with the given arguments, capturing output.
///
/// Only a failure to spawn the process is an error here; callers decide
/// what a non-zero exit means.
async fn run_git_in(cwd: Option<&Path>, args: &[&str]) -> BootstrapResult<GitOutcome> {
    let mut cmd = Command::new("git");
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(args = ?args, "running git");

    let output = cmd
        .output()
        .await
        .map_err(|e| BootstrapError::GitSpawn(e.to_string()))?;

    Ok(GitOutcome {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
