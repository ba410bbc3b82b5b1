//! The bootstrap driver: one sequential pass over the registry.
//!
//! Per node: resolve sources, synthesize the configuration document,
//! merge the environment file, then provision (local mode). Containerized
//! runs render and commit deployment artifacts after the loop, once every
//! node's state is in place. A fatal error at node *i* leaves nodes
//! *1..i* fully written; re-running is safe because every step is
//! idempotent or overwrite-safe.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::artifacts::{ArtifactGenerator, CommittedArtifacts};
use crate::config::OrchestratorConfig;
use crate::context::BootstrapContext;
use crate::envmerge;
use crate::error::BootstrapResult;
use crate::provision;
use crate::secrets::SecretStore;
use crate::source::{RepoResolver, ResolvedBranch};
use crate::synth;
use crate::topology::Topology;
use crate::types::{DeployMode, NodeName};

/// What one node's bootstrap pass produced.
#[derive(Debug)]
pub struct NodeReport {
    /// Repository name.
    pub name: NodeName,
    /// Service name advertised in the topology.
    pub service: String,
    /// Assigned port.
    pub port: u16,
    /// Which revision the resolver obtained.
    pub branch: ResolvedBranch,
    /// Where the configuration document was written.
    pub config_path: PathBuf,
    /// Local cache directory, from the document.
    pub cache_path: String,
    /// Coordinator address, empty for the coordinator itself.
    pub first_contact: String,
}

/// Outcome of a full bootstrap run.
#[derive(Debug)]
pub struct BootstrapReport {
    /// Mode the run executed in.
    pub mode: DeployMode,
    /// Per-node outcomes, in registry order.
    pub nodes: Vec<NodeReport>,
    /// Committed deployment artifacts (containerized mode only).
    pub artifacts: Option<CommittedArtifacts>,
    /// Required secrets still unset in the store (containerized mode only).
    pub unset_secrets: Vec<String>,
}

/// Drives the whole topology through resolution, synthesis, merging, and
/// mode-specific finalization.
pub struct Bootstrapper {
    config: OrchestratorConfig,
    topology: Topology,
    mode: DeployMode,
    branch: String,
}

impl Bootstrapper {
    /// Create a driver for the given settings, topology, and mode. The
    /// requested revision defaults to the configured branch.
    #[must_use]
    pub fn new(config: OrchestratorConfig, topology: Topology, mode: DeployMode) -> Self {
        let branch = config.git.default_branch.clone();
        Self {
            config,
            topology,
            mode,
            branch,
        }
    }

    /// Override the revision requested for every node this run.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Run the bootstrap. Fully sequential, registry order.
    pub async fn run(&self) -> BootstrapResult<BootstrapReport> {
        self.topology.validate()?;

        fs::create_dir_all(&self.config.workspace.root)?;
        fs::create_dir_all(self.config.templates_dir())?;

        let store_path = self.config.secret_store_path();
        SecretStore::seed(&store_path)?;
        let store = SecretStore::load(&store_path)?;

        let ctx = BootstrapContext::resolve(&self.topology, self.mode);
        let resolver = RepoResolver::new(&self.config.git.remote_base);

        info!(
            mode = %self.mode,
            branch = %self.branch,
            coordinator = %ctx.coordinator_url(),
            "bootstrapping topology"
        );

        let mut nodes = Vec::with_capacity(self.topology.nodes().len());
        for spec in self.topology.nodes() {
            let repo_dir = self.config.repo_dir(&spec.name);
            let resolved = resolver.resolve(&spec.name, &self.branch, &repo_dir).await?;

            let doc = spec.document(&ctx);
            let config_path = synth::write_document(&doc, &resolved.path)?;
            envmerge::merge_env_file(&resolved.path, spec.secret_requirements(), &store)?;

            if self.mode == DeployMode::Local {
                provision::provision(&spec.name, &resolved.path).await?;
            }

            nodes.push(NodeReport {
                name: spec.name.clone(),
                service: spec.service.to_owned(),
                port: spec.port,
                branch: resolved.branch,
                config_path,
                cache_path: doc.koi_net.cache_directory_path,
                first_contact: doc.koi_net.first_contact,
            });
        }

        let mut artifacts = None;
        let mut unset_secrets = Vec::new();
        if self.mode.is_containerized() {
            SecretStore::seed_example(&self.config.secret_store_example_path())?;
            unset_secrets = store.report_unset(&self.topology);

            let generator = ArtifactGenerator::new(self.config.templates_dir());
            let staged = generator.render(&self.topology, &self.config.workspace.root)?;
            artifacts = Some(staged.commit(&self.topology, &self.config.workspace.root)?);
        }

        info!(nodes = nodes.len(), "bootstrap complete");

        Ok(BootstrapReport {
            mode: self.mode,
            nodes,
            artifacts,
            unset_secrets,
        })
    }
}
