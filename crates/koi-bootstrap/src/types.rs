//! Core types shared across the bootstrapper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Loopback address used for local-mode bindings and URLs.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Bind-all address used for containerized bindings.
pub const ANY_HOST: &str = "0.0.0.0";

/// URL path under which every node serves its protocol endpoint.
pub const KOI_NET_PATH: &str = "/koi-net";

/// Name of a node repository (e.g. `koi-net-coordinator-node`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeName(String);

impl NodeName {
    /// Create a new node name from a string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// How the topology is going to be executed.
///
/// The mode decides bind hosts, the address scheme used for node URLs,
/// and whether runtime provisioning or artifact generation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployMode {
    /// Direct local processes; loopback addressing, venv provisioning.
    Local,
    /// Container services; service-name addressing, build files + manifest.
    Containerized,
}

impl DeployMode {
    /// The host every node binds its server to in this mode.
    #[must_use]
    pub const fn bind_host(self) -> &'static str {
        match self {
            Self::Local => LOOPBACK_HOST,
            Self::Containerized => ANY_HOST,
        }
    }

    /// Whether this mode produces container deployment artifacts.
    #[must_use]
    pub const fn is_containerized(self) -> bool {
        matches!(self, Self::Containerized)
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Containerized => write!(f, "containerized"),
        }
    }
}
