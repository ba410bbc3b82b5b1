//! The pre-pass that fixes every mode-dependent address before any
//! document is built.
//!
//! Resolving the coordinator address up front means document construction
//! is a single pure pass with no forward references and no shared mutable
//! address value.

use crate::topology::{NodeSpec, Topology};
use crate::types::{DeployMode, KOI_NET_PATH, LOOPBACK_HOST};

/// Everything a document builder needs to know about the deployment:
/// the mode, the bind host, and the coordinator's resolved base address.
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    mode: DeployMode,
    coordinator_url: String,
}

impl BootstrapContext {
    /// Resolve the context for a topology and mode.
    #[must_use]
    pub fn resolve(topology: &Topology, mode: DeployMode) -> Self {
        let coordinator = topology.coordinator();
        Self {
            mode,
            coordinator_url: node_base_url(coordinator, mode),
        }
    }

    /// The deployment mode this context was resolved for.
    #[must_use]
    pub const fn mode(&self) -> DeployMode {
        self.mode
    }

    /// The host every node binds to.
    #[must_use]
    pub const fn bind_host(&self) -> &'static str {
        self.mode.bind_host()
    }

    /// The coordinator's base address, as dependent nodes will dial it.
    #[must_use]
    pub fn coordinator_url(&self) -> &str {
        &self.coordinator_url
    }

    /// The advertised base address for a node in this deployment.
    #[must_use]
    pub fn base_url(&self, spec: &NodeSpec) -> String {
        node_base_url(spec, self.mode)
    }

    /// The `first_contact` value for a node: empty for the coordinator,
    /// the coordinator's base address for everyone else.
    #[must_use]
    pub fn first_contact(&self, spec: &NodeSpec) -> String {
        if spec.is_coordinator() {
            String::new()
        } else {
            self.coordinator_url.clone()
        }
    }
}

/// Mode-dependent base address: loopback IP locally, service name in
/// container networks.
fn node_base_url(spec: &NodeSpec, mode: DeployMode) -> String {
    let host = match mode {
        DeployMode::Local => LOOPBACK_HOST,
        DeployMode::Containerized => spec.service,
    };
    format!("http://{host}:{}{KOI_NET_PATH}", spec.port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_url_uses_loopback_in_local_mode() {
        let topology = Topology::standard();
        let ctx = BootstrapContext::resolve(&topology, DeployMode::Local);
        assert_eq!(ctx.coordinator_url(), "http://127.0.0.1:8080/koi-net");
    }

    #[test]
    fn coordinator_url_uses_service_name_in_containerized_mode() {
        let topology = Topology::standard();
        let ctx = BootstrapContext::resolve(&topology, DeployMode::Containerized);
        assert_eq!(ctx.coordinator_url(), "http://coordinator:8080/koi-net");
    }

    #[test]
    fn coordinator_has_empty_first_contact() {
        let topology = Topology::standard();
        let ctx = BootstrapContext::resolve(&topology, DeployMode::Local);
        assert_eq!(ctx.first_contact(topology.coordinator()), "");
    }

    #[test]
    fn every_other_node_contacts_the_coordinator() {
        let topology = Topology::standard();
        for mode in [DeployMode::Local, DeployMode::Containerized] {
            let ctx = BootstrapContext::resolve(&topology, mode);
            for spec in topology.nodes().iter().filter(|n| !n.is_coordinator()) {
                assert_eq!(ctx.first_contact(spec), ctx.coordinator_url());
            }
        }
    }

    #[test]
    fn base_url_follows_mode() {
        let topology = Topology::standard();
        let sensor = topology.find("github-sensor").unwrap();

        let local = BootstrapContext::resolve(&topology, DeployMode::Local);
        assert_eq!(local.base_url(sensor), "http://127.0.0.1:8001/koi-net");

        let containerized = BootstrapContext::resolve(&topology, DeployMode::Containerized);
        assert_eq!(
            containerized.base_url(sensor),
            "http://github-sensor:8001/koi-net"
        );
    }
}
