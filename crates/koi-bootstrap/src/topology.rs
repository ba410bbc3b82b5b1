//! The topology registry: the fixed, ordered catalog of node definitions.
//!
//! Each registry row is a complete description of one participant — its
//! repository, service and module names, assigned port, and the secrets it
//! requires. Document construction itself lives in [`crate::document`]; the
//! registry only carries the data that drives it.

use crate::error::{BootstrapError, BootstrapResult};
use crate::types::NodeName;

/// Which document builder a registry row selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The single node every other node bootstraps through.
    Coordinator,
    /// Ingests GitHub events.
    GithubSensor,
    /// Ingests HackMD notes.
    HackmdSensor,
    /// Processes GitHub events into an index.
    GithubProcessor,
    /// Processes HackMD notes into an index.
    HackmdProcessor,
}

/// One row of the topology registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Repository directory name, also the clone target.
    pub name: NodeName,
    /// Compose service name; also the container-mode hostname.
    pub service: &'static str,
    /// Language-runtime module identifier baked into build files.
    pub module: &'static str,
    /// Assigned network port, unique across the topology.
    pub port: u16,
    /// Port the shared manifest template was authored against.
    pub template_port: u16,
    /// Selects the document builder for this node.
    pub kind: NodeKind,
}

impl NodeSpec {
    /// Whether this row is the coordinator.
    #[must_use]
    pub const fn is_coordinator(&self) -> bool {
        matches!(self.kind, NodeKind::Coordinator)
    }

    /// The `(logical_name, SECRET_KEY)` pairs this node declares.
    ///
    /// Logical names are the keys the node's own configuration uses to look
    /// the secrets up; the upper-case keys address the shared secret store
    /// and the node's local `.env` file.
    #[must_use]
    pub const fn secret_requirements(&self) -> &'static [(&'static str, &'static str)] {
        match self.kind {
            NodeKind::Coordinator | NodeKind::HackmdProcessor => &[],
            NodeKind::GithubSensor => &[
                ("github_token", "GITHUB_TOKEN"),
                ("github_webhook_secret", "GITHUB_WEBHOOK_SECRET"),
            ],
            NodeKind::HackmdSensor => &[("hackmd_api_token", "HACKMD_API_TOKEN")],
            NodeKind::GithubProcessor => &[("github_token", "GITHUB_TOKEN")],
        }
    }
}

/// The ordered collection of all nodes.
///
/// Iteration order is processing order. The coordinator is always first so
/// its address is known before any dependent document is emitted.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<NodeSpec>,
}

impl Topology {
    /// Build a topology from explicit rows, validating the registry
    /// invariants: exactly one coordinator, pairwise-distinct ports,
    /// pairwise-distinct names.
    pub fn new(nodes: Vec<NodeSpec>) -> BootstrapResult<Self> {
        let topology = Self { nodes };
        topology.validate()?;
        Ok(topology)
    }

    /// The standard five-node KOI-net registry.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            nodes: vec![
                NodeSpec {
                    name: NodeName::from("koi-net-coordinator-node"),
                    service: "coordinator",
                    module: "coordinator_node",
                    port: 8080,
                    template_port: 8080,
                    kind: NodeKind::Coordinator,
                },
                NodeSpec {
                    name: NodeName::from("koi-net-hackmd-sensor-node"),
                    service: "hackmd-sensor",
                    module: "hackmd_sensor_node",
                    port: 8002,
                    template_port: 8002,
                    kind: NodeKind::HackmdSensor,
                },
                NodeSpec {
                    name: NodeName::from("koi-net-github-sensor-node"),
                    service: "github-sensor",
                    module: "github_sensor_node",
                    port: 8001,
                    template_port: 8001,
                    kind: NodeKind::GithubSensor,
                },
                NodeSpec {
                    name: NodeName::from("koi-net-github-processor-node"),
                    service: "github-processor",
                    module: "github_processor_node",
                    port: 8011,
                    template_port: 8011,
                    kind: NodeKind::GithubProcessor,
                },
                NodeSpec {
                    name: NodeName::from("koi-net-hackmd-processor-node"),
                    service: "hackmd-processor",
                    module: "hackmd_processor_node",
                    port: 8012,
                    template_port: 8012,
                    kind: NodeKind::HackmdProcessor,
                },
            ],
        }
    }

    /// Check the registry invariants.
    pub fn validate(&self) -> BootstrapResult<()> {
        let coordinators = self.nodes.iter().filter(|n| n.is_coordinator()).count();
        if coordinators != 1 {
            return Err(BootstrapError::InvalidTopology(format!(
                "expected exactly one coordinator, found {coordinators}"
            )));
        }

        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                if a.port == b.port {
                    return Err(BootstrapError::InvalidTopology(format!(
                        "port {} assigned to both {} and {}",
                        a.port, a.name, b.name
                    )));
                }
                if a.name == b.name {
                    return Err(BootstrapError::InvalidTopology(format!(
                        "duplicate node name: {}",
                        a.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// The coordinator row.
    ///
    /// Valid topologies have exactly one; [`Topology::new`] enforces this.
    #[must_use]
    pub fn coordinator(&self) -> &NodeSpec {
        self.nodes
            .iter()
            .find(|n| n.is_coordinator())
            .unwrap_or(&self.nodes[0])
    }

    /// All rows, in processing order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Look a row up by repository name or service name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes
            .iter()
            .find(|n| n.name.as_str() == name || n.service == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_topology_is_valid() {
        assert!(Topology::standard().validate().is_ok());
    }

    #[test]
    fn standard_topology_has_exactly_one_coordinator() {
        let topology = Topology::standard();
        let coordinators: Vec<_> = topology
            .nodes()
            .iter()
            .filter(|n| n.is_coordinator())
            .collect();
        assert_eq!(coordinators.len(), 1);
        assert_eq!(coordinators[0].service, "coordinator");
    }

    #[test]
    fn standard_topology_puts_coordinator_first() {
        let topology = Topology::standard();
        assert!(topology.nodes()[0].is_coordinator());
    }

    #[test]
    fn ports_are_pairwise_distinct() {
        let topology = Topology::standard();
        let mut ports: Vec<u16> = topology.nodes().iter().map(|n| n.port).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), topology.nodes().len());
    }

    #[test]
    fn duplicate_port_is_rejected() {
        let mut nodes = Topology::standard().nodes().to_vec();
        nodes[1].port = nodes[0].port;
        let err = Topology::new(nodes).unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn second_coordinator_is_rejected() {
        let mut nodes = Topology::standard().nodes().to_vec();
        nodes[1].kind = NodeKind::Coordinator;
        let err = Topology::new(nodes).unwrap_err();
        assert!(err.to_string().contains("coordinator"));
    }

    #[test]
    fn find_accepts_repo_and_service_names() {
        let topology = Topology::standard();
        assert!(topology.find("koi-net-github-sensor-node").is_some());
        assert!(topology.find("github-sensor").is_some());
        assert!(topology.find("unknown").is_none());
    }
}
