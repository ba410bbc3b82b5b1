//! Implementation of the `koi setup` and `koi docker-setup` commands.

use koi_bootstrap::source::ResolvedBranch;
use koi_bootstrap::{
    BootstrapError, BootstrapReport, Bootstrapper, DeployMode, OrchestratorConfig, Topology,
};

/// Acquire and configure every node for local execution.
pub async fn run_local(branch: Option<String>) -> Result<(), BootstrapError> {
    let report = bootstrap(DeployMode::Local, branch).await?;
    print_summary(&report);

    println!();
    println!("Each repository now has its own virtual environment in '.venv/'.");
    println!("Run a node with: koi run <node>");
    Ok(())
}

/// Acquire and configure every node for container execution, generating
/// build files and the shared manifest.
pub async fn run_containerized(branch: Option<String>) -> Result<(), BootstrapError> {
    let report = bootstrap(DeployMode::Containerized, branch).await?;
    print_summary(&report);

    if !report.unset_secrets.is_empty() {
        println!();
        println!("The following secrets are not set in global.env:");
        for key in &report.unset_secrets {
            println!("  - {key}");
        }
        println!("Edit global.env before starting the containers.");
    }

    println!();
    println!("Next steps:");
    println!("  koi docker-up");
    Ok(())
}

async fn bootstrap(
    mode: DeployMode,
    branch: Option<String>,
) -> Result<BootstrapReport, BootstrapError> {
    let config = OrchestratorConfig::load()?;
    let mut bootstrapper = Bootstrapper::new(config, Topology::standard(), mode);
    if let Some(branch) = branch {
        bootstrapper = bootstrapper.with_branch(branch);
    }
    bootstrapper.run().await
}

fn print_summary(report: &BootstrapReport) {
    println!();
    println!("KOI-net topology ({} mode)", report.mode);
    println!(
        "{:<34} {:<18} {:>5}  {:<10} {}",
        "Repo", "Service", "Port", "Branch", "First contact"
    );
    for node in &report.nodes {
        let branch = match node.branch {
            ResolvedBranch::Requested => "requested",
            ResolvedBranch::DefaultFallback => "default",
            ResolvedBranch::ExistingState => "existing",
        };
        let first_contact = if node.first_contact.is_empty() {
            "-"
        } else {
            node.first_contact.as_str()
        };
        println!(
            "{:<34} {:<18} {:>5}  {:<10} {}",
            node.name, node.service, node.port, branch, first_contact
        );
    }
}
