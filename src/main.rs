//! dockhand CLI - spawn and tear down agent containers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dockhand::{
    AgentOrchestrator, DefaultDescriptorGenerator, DockerRuntime, DotEnvLoader,
    OrchestratorConfig, ProbeSessionEstablisher, SpawnRequest,
};

#[derive(Parser, Debug)]
#[command(name = "dockhand")]
#[command(about = "Container lifecycle orchestrator for autonomous agents")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Spawn an agent container.
    Spawn {
        /// Task description handed to the agent.
        #[arg(long)]
        task: String,

        /// Agent id (generated when omitted).
        #[arg(long)]
        agent_id: Option<String>,

        /// Host directory to bind-mount directly (shared mode).
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Git repository URL to seed a per-agent volume (isolated mode;
        /// takes precedence over --workspace).
        #[arg(long)]
        repository: Option<String>,

        /// Agent type forwarded to the descriptor generator.
        #[arg(long)]
        agent_type: Option<String>,
    },

    /// Remove an agent's workspace volume.
    Cleanup {
        /// Agent id whose volume should be removed.
        agent_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dockhand=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = OrchestratorConfig::resolve()?;
    tracing::info!(image = %config.image, "resolved orchestrator configuration");

    let runtime: Arc<dyn dockhand::ContainerRuntime> =
        Arc::new(DockerRuntime::connect().await?);
    tracing::info!("connected to docker daemon");

    let session: Arc<dyn dockhand::SessionEstablisher> =
        Arc::new(ProbeSessionEstablisher::new(runtime.clone()));
    let orchestrator = AgentOrchestrator::new(
        config.clone(),
        runtime,
        Arc::new(DotEnvLoader),
        Arc::new(DefaultDescriptorGenerator::new(&config)),
        Some(session),
    );

    match args.command {
        Command::Spawn {
            task,
            agent_id,
            workspace,
            repository,
            agent_type,
        } => {
            let agent_id =
                agent_id.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
            let agent = orchestrator
                .spawn(SpawnRequest {
                    agent_id,
                    task,
                    workspace,
                    repository,
                    agent_type,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&agent)?);
        }
        Command::Cleanup { agent_id } => {
            orchestrator.cleanup_agent(&agent_id).await;
        }
    }

    Ok(())
}
