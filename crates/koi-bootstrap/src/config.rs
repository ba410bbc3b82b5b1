//! Orchestrator settings, loaded from `koi.toml` and the environment.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::BootstrapResult;
use crate::types::NodeName;

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrchestratorConfig {
    /// Workspace layout settings.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Git acquisition settings.
    #[serde(default)]
    pub git: GitSettings,
}

impl OrchestratorConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources
    /// override earlier):
    /// 1. Default values
    /// 2. `koi.toml` in the current directory (if present)
    /// 3. Environment variables with `KOI_` prefix
    pub fn load() -> BootstrapResult<Self> {
        Figment::new()
            .merge(Toml::file("koi.toml"))
            .merge(Env::prefixed("KOI_").split("__"))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> BootstrapResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("KOI_").split("__"))
            .extract()
            .map_err(Into::into)
    }

    /// Directory a node's working copy lives in.
    #[must_use]
    pub fn repo_dir(&self, name: &NodeName) -> PathBuf {
        self.workspace.root.join(name.as_str())
    }

    /// Directory holding the deployment templates.
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.workspace.root.join(&self.workspace.templates_dir)
    }

    /// Path of the shared secret store file.
    #[must_use]
    pub fn secret_store_path(&self) -> PathBuf {
        self.workspace.root.join(&self.workspace.secret_store)
    }

    /// Path of the secret store example companion.
    #[must_use]
    pub fn secret_store_example_path(&self) -> PathBuf {
        let mut name = self.workspace.secret_store.clone();
        name.push_str(".example");
        self.workspace.root.join(name)
    }

    /// Path the shared manifest is committed to.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.workspace.root.join("docker-compose.yml")
    }
}

/// Where the orchestrator keeps node checkouts, templates, and shared
/// state.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory node repositories are cloned under.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Templates directory, relative to the root.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Secret store file name, relative to the root.
    #[serde(default = "default_secret_store")]
    pub secret_store: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_templates_dir() -> String {
    "templates".to_owned()
}

fn default_secret_store() -> String {
    "global.env".to_owned()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            templates_dir: default_templates_dir(),
            secret_store: default_secret_store(),
        }
    }
}

/// How node repositories are acquired.
#[derive(Debug, Clone, Deserialize)]
pub struct GitSettings {
    /// Base URL repositories are cloned from; the repository name is
    /// appended.
    #[serde(default = "default_remote_base")]
    pub remote_base: String,

    /// Revision requested for every node unless overridden per run.
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_remote_base() -> String {
    "https://github.com/BlockScience".to_owned()
}

fn default_branch() -> String {
    "demo-1".to_owned()
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote_base: default_remote_base(),
            default_branch: default_branch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.workspace.root, PathBuf::from("."));
        assert_eq!(config.git.default_branch, "demo-1");
        assert_eq!(config.secret_store_path(), PathBuf::from("./global.env"));
        assert_eq!(
            config.secret_store_example_path(),
            PathBuf::from("./global.env.example")
        );
    }

    #[test]
    fn toml_overrides_defaults() {
        let config: OrchestratorConfig = Figment::new()
            .merge(Toml::string(
                r#"
                [workspace]
                root = "/srv/koi"
                templates_dir = "deploy/templates"

                [git]
                default_branch = "main"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.workspace.root, PathBuf::from("/srv/koi"));
        assert_eq!(config.templates_dir(), PathBuf::from("/srv/koi/deploy/templates"));
        assert_eq!(config.git.default_branch, "main");
        // Untouched section keeps its default.
        assert_eq!(config.git.remote_base, "https://github.com/BlockScience");
    }

    #[test]
    fn repo_dir_joins_workspace_root() {
        let config = OrchestratorConfig::default();
        let name = NodeName::from("koi-net-coordinator-node");
        assert_eq!(
            config.repo_dir(&name),
            PathBuf::from("./koi-net-coordinator-node")
        );
    }
}
