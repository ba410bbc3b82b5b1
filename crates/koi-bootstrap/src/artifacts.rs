//! Deployment artifact generation for containerized mode.
//!
//! Renders one build file per node and the shared multi-service manifest
//! from templates. Everything is rendered into a scratch directory first
//! and committed in one pass only when every render has succeeded, so a
//! missing or broken template leaves no partial artifact state behind.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{BootstrapError, BootstrapResult};
use crate::topology::{NodeSpec, Topology};
use crate::types::NodeName;

/// Build file template name, expected in the templates directory.
pub const BUILD_TEMPLATE: &str = "Dockerfile.template";

/// Manifest template name, expected in the templates directory.
pub const MANIFEST_TEMPLATE: &str = "docker-compose.template.yml";

/// Name of the committed manifest.
pub const MANIFEST_FILE: &str = "docker-compose.yml";

/// Name of the committed per-node build file.
pub const BUILD_FILE: &str = "Dockerfile";

/// Default-port token the build file template is authored with.
const BUILD_PORT_TOKEN: &str = "ARG PORT=8080";

/// Renders deployment artifacts from the templates directory.
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    templates_dir: PathBuf,
}

/// Rendered artifacts, staged but not yet visible in the workspace.
#[derive(Debug)]
pub struct StagedArtifacts {
    staging: TempDir,
    build_files: Vec<NodeName>,
}

/// Paths the commit pass produced.
#[derive(Debug)]
pub struct CommittedArtifacts {
    /// One build file per node, in registry order.
    pub build_files: Vec<PathBuf>,
    /// The shared manifest.
    pub manifest: PathBuf,
}

impl ArtifactGenerator {
    /// Create a generator reading templates from `templates_dir`.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    /// Render all artifacts for a topology into a staging directory under
    /// `workspace_root`.
    ///
    /// Fails without touching the workspace if either template is missing
    /// or unreadable. The staging directory lives inside the workspace
    /// root so the later commit is a same-filesystem rename.
    pub fn render(
        &self,
        topology: &Topology,
        workspace_root: &Path,
    ) -> BootstrapResult<StagedArtifacts> {
        let build_template = self.read_template(BUILD_TEMPLATE)?;
        let manifest_template = self.read_template(MANIFEST_TEMPLATE)?;

        let staging = tempfile::Builder::new()
            .prefix(".koi-artifacts-")
            .tempdir_in(workspace_root)?;

        let mut build_files = Vec::with_capacity(topology.nodes().len());
        for spec in topology.nodes() {
            let rendered = render_build_file(&build_template, spec);
            let staged = staging.path().join(format!("{BUILD_FILE}.{}", spec.service));
            fs::write(&staged, rendered)?;
            debug!(node = %spec.name, port = spec.port, "staged build file");
            build_files.push(spec.name.clone());
        }

        let manifest = render_manifest(&manifest_template, topology);
        fs::write(staging.path().join(MANIFEST_FILE), manifest)?;
        debug!("staged deployment manifest");

        Ok(StagedArtifacts {
            staging,
            build_files,
        })
    }

    fn read_template(&self, name: &str) -> BootstrapResult<String> {
        let path = self.templates_dir.join(name);
        if !path.exists() {
            return Err(BootstrapError::MissingTemplate { path });
        }
        Ok(fs::read_to_string(path)?)
    }
}

impl StagedArtifacts {
    /// Move every staged artifact into place: build files into each node's
    /// repository directory, the manifest into the workspace root.
    ///
    /// Existing files at the target paths are replaced.
    pub fn commit(self, topology: &Topology, workspace_root: &Path) -> BootstrapResult<CommittedArtifacts> {
        let mut committed = Vec::with_capacity(self.build_files.len());

        for name in &self.build_files {
            let spec = topology
                .find(name.as_str())
                .ok_or_else(|| BootstrapError::UnknownNode(name.to_string()))?;
            let staged = self.staging.path().join(format!("{BUILD_FILE}.{}", spec.service));
            let target_dir = workspace_root.join(name.as_str());
            fs::create_dir_all(&target_dir)?;
            let target = target_dir.join(BUILD_FILE);
            fs::rename(&staged, &target)?;
            info!(path = %target.display(), "wrote build file");
            committed.push(target);
        }

        let manifest = workspace_root.join(MANIFEST_FILE);
        fs::rename(self.staging.path().join(MANIFEST_FILE), &manifest)?;
        info!(path = %manifest.display(), "wrote deployment manifest");

        Ok(CommittedArtifacts {
            build_files: committed,
            manifest,
        })
    }
}

/// Substitute the module-name and default-port tokens of the build file
/// template.
fn render_build_file(template: &str, spec: &NodeSpec) -> String {
    template
        .replace("${MODULE_NAME}", spec.module)
        .replace("$MODULE_NAME", spec.module)
        .replace(BUILD_PORT_TOKEN, &format!("ARG PORT={}", spec.port))
}

/// Substitute every node's port into the manifest template.
///
/// The template is authored against each node's `template_port`; all
/// textual contexts that port appears in — binding argument, host:container
/// mapping, loopback references — are rewritten to the assigned port.
fn render_manifest(template: &str, topology: &Topology) -> String {
    let mut rendered = template.to_owned();
    for spec in topology.nodes() {
        let from = spec.template_port;
        let to = spec.port;
        rendered = rendered
            .replace(&format!("PORT={from}"), &format!("PORT={to}"))
            .replace(&format!("\"{from}:{from}\""), &format!("\"{to}:{to}\""))
            .replace(&format!("localhost:{from}"), &format!("localhost:{to}"));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;

    const DOCKERFILE_TEMPLATE: &str = "\
FROM python:3.12-slim
ARG PORT=8080
COPY . /app
CMD [\"python\", \"-m\", \"${MODULE_NAME}\"]
EXPOSE $PORT
";

    fn workspace_with_templates() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join(BUILD_TEMPLATE), DOCKERFILE_TEMPLATE).unwrap();
        fs::write(
            templates.join(MANIFEST_TEMPLATE),
            "services:\n  coordinator:\n    command: [\"--port\", \"PORT=8080\"]\n    ports:\n      - \"8080:8080\"\n    healthcheck: localhost:8080\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn build_file_substitutes_module_and_port() {
        let topology = Topology::standard();
        let sensor = topology.find("github-sensor").unwrap();
        let rendered = render_build_file(DOCKERFILE_TEMPLATE, sensor);
        assert!(rendered.contains("ARG PORT=8001"));
        assert!(rendered.contains("python\", \"-m\", \"github_sensor_node"));
        assert!(!rendered.contains("MODULE_NAME"));
    }

    #[test]
    fn manifest_substitutes_all_port_contexts() {
        let mut nodes = Topology::standard().nodes().to_vec();
        // Re-assign the coordinator port away from the template default.
        nodes[0].port = 9090;
        let topology = Topology::new(nodes).unwrap();

        let template =
            "command: PORT=8080\nports:\n  - \"8080:8080\"\nhealthcheck: localhost:8080\n";
        let rendered = render_manifest(template, &topology);
        assert_eq!(
            rendered,
            "command: PORT=9090\nports:\n  - \"9090:9090\"\nhealthcheck: localhost:9090\n"
        );
    }

    #[test]
    fn render_and_commit_writes_all_artifacts() {
        let dir = workspace_with_templates();
        let topology = Topology::standard();
        let generator = ArtifactGenerator::new(dir.path().join("templates"));

        let staged = generator.render(&topology, dir.path()).unwrap();
        let committed = staged.commit(&topology, dir.path()).unwrap();

        assert_eq!(committed.build_files.len(), 5);
        for spec in topology.nodes() {
            let build_file = dir.path().join(spec.name.as_str()).join(BUILD_FILE);
            let content = fs::read_to_string(build_file).unwrap();
            assert!(content.contains(&format!("ARG PORT={}", spec.port)));
            assert!(content.contains(spec.module));
        }
        assert!(committed.manifest.exists());
    }

    #[test]
    fn missing_build_template_is_fatal_and_writes_nothing() {
        let dir = workspace_with_templates();
        fs::remove_file(dir.path().join("templates").join(BUILD_TEMPLATE)).unwrap();

        let topology = Topology::standard();
        let generator = ArtifactGenerator::new(dir.path().join("templates"));
        let err = generator.render(&topology, dir.path()).unwrap_err();

        assert!(matches!(err, BootstrapError::MissingTemplate { .. }));
        assert!(!dir.path().join(MANIFEST_FILE).exists());
        for spec in topology.nodes() {
            assert!(!dir.path().join(spec.name.as_str()).join(BUILD_FILE).exists());
        }
    }

    #[test]
    fn missing_manifest_template_is_fatal_and_writes_nothing() {
        let dir = workspace_with_templates();
        fs::remove_file(dir.path().join("templates").join(MANIFEST_TEMPLATE)).unwrap();

        let topology = Topology::standard();
        let generator = ArtifactGenerator::new(dir.path().join("templates"));
        let err = generator.render(&topology, dir.path()).unwrap_err();

        assert!(matches!(err, BootstrapError::MissingTemplate { .. }));
        for spec in topology.nodes() {
            assert!(!dir.path().join(spec.name.as_str()).join(BUILD_FILE).exists());
        }
    }

    #[test]
    fn commit_replaces_existing_artifacts() {
        let dir = workspace_with_templates();
        let topology = Topology::standard();
        fs::write(dir.path().join(MANIFEST_FILE), "stale\n").unwrap();

        let generator = ArtifactGenerator::new(dir.path().join("templates"));
        generator
            .render(&topology, dir.path())
            .unwrap()
            .commit(&topology, dir.path())
            .unwrap();

        let manifest = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        assert!(!manifest.contains("stale"));
    }
}
