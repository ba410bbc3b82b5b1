//! The per-node configuration document: a typed schema plus one builder
//! per registry row.
//!
//! Builders are pure: the same spec, port, and context always produce the
//! same document, so synthesis can be re-run and compared byte for byte.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::BootstrapContext;
use crate::topology::{NodeKind, NodeSpec};
use crate::types::KOI_NET_PATH;

/// Server binding section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Bind host; mode-dependent.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// URL path of the protocol endpoint.
    pub path: String,
}

/// Event/state categories a node advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provides {
    pub event: Vec<String>,
    pub state: Vec<String>,
}

/// The capability advertisement other nodes see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProfile {
    /// Advertised base address; mode-dependent.
    pub base_url: String,
    pub node_type: String,
    pub provides: Provides,
}

/// Node identity and network section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KoiNetSection {
    pub node_name: String,
    pub node_rid: String,
    pub node_profile: NodeProfile,
    pub cache_directory_path: String,
    pub event_queues_path: String,
    /// Coordinator address, or empty if this node is the coordinator.
    pub first_contact: String,
}

/// GitHub sensor extension section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSection {
    pub api_url: String,
    pub monitored_repositories: Vec<MonitoredRepository>,
    pub backfill_max_items: u32,
    pub backfill_lookback_days: u32,
    pub backfill_state_file_path: String,
}

/// One repository the GitHub sensor watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredRepository {
    pub name: String,
}

/// HackMD sensor extension section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HackmdSection {
    pub team_path: String,
    pub target_note_ids: Vec<String>,
}

/// The complete per-node configuration document.
///
/// Extension sections are explicit optionals; serialization skips the ones
/// a node does not carry. Field order is fixed by the struct, which keeps
/// the emitted YAML stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub server: ServerSection,
    pub koi_net: KoiNetSection,
    /// Logical secret name → environment key mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hackmd: Option<HackmdSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_db_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_retry_initial: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_retry_multiplier: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_retry_max_attempts: Option<u32>,
}

impl NodeSpec {
    /// Build this node's configuration document for the given context.
    #[must_use]
    pub fn document(&self, ctx: &BootstrapContext) -> ConfigDocument {
        let identity = identity(self.kind);

        let mut doc = ConfigDocument {
            server: ServerSection {
                host: ctx.bind_host().to_owned(),
                port: self.port,
                path: KOI_NET_PATH.to_owned(),
            },
            koi_net: KoiNetSection {
                node_name: self.service.to_owned(),
                node_rid: identity.rid.to_owned(),
                node_profile: NodeProfile {
                    base_url: ctx.base_url(self),
                    node_type: "FULL".to_owned(),
                    provides: Provides {
                        event: to_owned_vec(identity.provides),
                        state: to_owned_vec(identity.provides),
                    },
                },
                cache_directory_path: identity.cache_directory.to_owned(),
                event_queues_path: identity.event_queues.to_owned(),
                first_contact: ctx.first_contact(self),
            },
            env: None,
            github: None,
            hackmd: None,
            index_db_path: None,
            fetch_retry_initial: None,
            fetch_retry_multiplier: None,
            fetch_retry_max_attempts: None,
        };

        let requirements = self.secret_requirements();
        if !requirements.is_empty() {
            doc.env = Some(
                requirements
                    .iter()
                    .map(|(logical, key)| ((*logical).to_owned(), (*key).to_owned()))
                    .collect(),
            );
        }

        match self.kind {
            NodeKind::Coordinator => {}
            NodeKind::GithubSensor => {
                doc.github = Some(GithubSection {
                    api_url: "https://api.github.com/".to_owned(),
                    monitored_repositories: vec![MonitoredRepository {
                        name: "Blockscience/koi-net".to_owned(),
                    }],
                    backfill_max_items: 50,
                    backfill_lookback_days: 30,
                    backfill_state_file_path: ".koi/github/github_state.json".to_owned(),
                });
            }
            NodeKind::HackmdSensor => {
                doc.hackmd = Some(HackmdSection {
                    team_path: "blockscience".to_owned(),
                    target_note_ids: vec!["C1xso4C8SH-ZzDaloTq4Uw".to_owned()],
                });
            }
            NodeKind::GithubProcessor => {
                doc.index_db_path = Some(".koi/github-processor/index.db".to_owned());
            }
            NodeKind::HackmdProcessor => {
                doc.index_db_path = Some(".koi/index_db/index.db".to_owned());
                doc.fetch_retry_initial = Some(30);
                doc.fetch_retry_multiplier = Some(2);
                doc.fetch_retry_max_attempts = Some(3);
            }
        }

        doc
    }
}

/// Fixed identity data per node kind: resource identifier, capability
/// advertisement, and local state paths.
struct Identity {
    rid: &'static str,
    provides: &'static [&'static str],
    cache_directory: &'static str,
    event_queues: &'static str,
}

const fn identity(kind: NodeKind) -> Identity {
    match kind {
        NodeKind::Coordinator => Identity {
            rid: "orn:koi-net.node:coordinator+40610903-4272-4494-91fd-1e57501a0980",
            provides: &["orn:koi-net.node", "orn:koi-net.edge"],
            cache_directory: ".koi",
            event_queues: ".koi/coordinator/queues.json",
        },
        NodeKind::GithubSensor => Identity {
            rid: "orn:koi-net.node:github-sensor+04075a17-b636-48e0-9e2b-104da4710e34",
            provides: &["orn:github.event"],
            cache_directory: ".koi/github_sensor_cache",
            event_queues: ".koi/queues.json",
        },
        NodeKind::HackmdSensor => Identity {
            rid: "orn:koi-net.node:hackmd-sensor+c1311da2-023f-4ce5-a262-6b9a6db85dea",
            provides: &["orn:hackmd.note"],
            cache_directory: ".koi/cache",
            event_queues: ".koi/hackmd/queues.json",
        },
        NodeKind::GithubProcessor => Identity {
            rid: "orn:koi-net.node:github-processor+0bf78f28-9f56-4d31-8377-a33f49a0828e",
            provides: &[],
            cache_directory: ".koi/github-processor/cache",
            event_queues: ".koi/github-processor/queues.json",
        },
        NodeKind::HackmdProcessor => Identity {
            rid: "orn:koi-net.node:hackmd-processor+62eabec3-ed43-4122-94cc-ea7aa8701fde",
            provides: &[],
            cache_directory: ".koi/hackmd-processor",
            event_queues: ".koi/hackmd-processor/queues.json",
        },
    }
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;
    use crate::types::DeployMode;

    fn docs(mode: DeployMode) -> Vec<(NodeSpec, ConfigDocument)> {
        let topology = Topology::standard();
        let ctx = BootstrapContext::resolve(&topology, mode);
        topology
            .nodes()
            .iter()
            .map(|spec| (spec.clone(), spec.document(&ctx)))
            .collect()
    }

    #[test]
    fn builders_are_deterministic() {
        let topology = Topology::standard();
        let ctx = BootstrapContext::resolve(&topology, DeployMode::Local);
        for spec in topology.nodes() {
            assert_eq!(spec.document(&ctx), spec.document(&ctx));
        }
    }

    #[test]
    fn exactly_one_document_has_empty_first_contact() {
        for mode in [DeployMode::Local, DeployMode::Containerized] {
            let empty = docs(mode)
                .iter()
                .filter(|(_, doc)| doc.koi_net.first_contact.is_empty())
                .count();
            assert_eq!(empty, 1);
        }
    }

    #[test]
    fn local_mode_binds_loopback() {
        for (_, doc) in docs(DeployMode::Local) {
            assert_eq!(doc.server.host, "127.0.0.1");
            assert!(doc.koi_net.node_profile.base_url.starts_with("http://127.0.0.1:"));
        }
    }

    #[test]
    fn containerized_mode_binds_any_and_advertises_service_names() {
        for (spec, doc) in docs(DeployMode::Containerized) {
            assert_eq!(doc.server.host, "0.0.0.0");
            assert_eq!(
                doc.koi_net.node_profile.base_url,
                format!("http://{}:{}/koi-net", spec.service, spec.port)
            );
        }
    }

    #[test]
    fn sensor_documents_carry_env_sections() {
        for (spec, doc) in docs(DeployMode::Local) {
            if spec.secret_requirements().is_empty() {
                assert!(doc.env.is_none());
            } else {
                let env = doc.env.expect("env section");
                for (logical, key) in spec.secret_requirements() {
                    assert_eq!(env.get(*logical).map(String::as_str), Some(*key));
                }
            }
        }
    }

    #[test]
    fn processor_documents_carry_index_paths() {
        let all = docs(DeployMode::Local);
        let github = &all.iter().find(|(s, _)| s.service == "github-processor").unwrap().1;
        assert_eq!(
            github.index_db_path.as_deref(),
            Some(".koi/github-processor/index.db")
        );

        let hackmd = &all.iter().find(|(s, _)| s.service == "hackmd-processor").unwrap().1;
        assert_eq!(hackmd.fetch_retry_initial, Some(30));
        assert_eq!(hackmd.fetch_retry_multiplier, Some(2));
        assert_eq!(hackmd.fetch_retry_max_attempts, Some(3));
    }
}
