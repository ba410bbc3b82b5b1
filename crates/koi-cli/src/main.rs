//! KOI-net CLI - bootstrap and run a KOI-net topology.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "koi")]
#[command(about = "Bootstrap and run a KOI-net node topology")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone node repositories, generate configurations, and provision
    /// local environments
    Setup {
        /// Git branch to check out for every repository
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Generate container deployment state (configs, build files, manifest)
    DockerSetup {
        /// Git branch to check out for every repository
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Run a single node from its provisioned environment
    Run {
        /// Node name (repository or service name, e.g. "coordinator")
        node: String,
    },

    /// Start all container services
    DockerUp,

    /// Stop all container services
    DockerDown,

    /// Remove generated configuration, artifacts, and node state
    Clean,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), anyhow::Error> = match cli.command {
        Commands::Setup { branch } => commands::setup::run_local(branch).await.map_err(Into::into),
        Commands::DockerSetup { branch } => commands::setup::run_containerized(branch)
            .await
            .map_err(Into::into),
        Commands::Run { node } => commands::run::run(&node).await.map_err(Into::into),
        Commands::DockerUp => commands::compose::up().await.map_err(Into::into),
        Commands::DockerDown => commands::compose::down().await.map_err(Into::into),
        Commands::Clean => commands::clean::run().map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
