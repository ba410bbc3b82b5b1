//! Error types for the bootstrapper.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while bootstrapping a topology.
#[derive(Debug, Error)]
pub enum BootstrapError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load or parse orchestrator settings.
    #[error("failed to load configuration: {0}")]
    Config(String),

    /// The topology violates a registry invariant.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A node name that is not part of the registry.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Source resolution errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The repository could not be acquired at all.
    #[error("failed to acquire repository {repo}: {message}")]
    RepoUnavailable {
        /// Repository name.
        repo: String,
        /// Underlying git error output.
        message: String,
    },

    /// A git invocation could not be spawned.
    #[error("failed to run git: {0}")]
    GitSpawn(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Artifact generation errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A required template file is missing.
    #[error("template not found: {}", path.display())]
    MissingTemplate {
        /// Expected template path.
        path: PathBuf,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Provisioning errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Runtime provisioning failed for a node.
    #[error("provisioning failed for {node}: {message}")]
    Provision {
        /// Node repository name.
        node: String,
        /// What went wrong.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Infrastructure errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to serialize a configuration document.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for BootstrapError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type alias for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
