//! Agent spawn and teardown.

use std::sync::Arc;

use crate::collaborators::{
    DescriptorContext, EnvLoader, ServiceDescriptorGenerator, SessionEstablisher,
};
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::orchestrator::binds::{BindSpec, build_git_binds};
use crate::orchestrator::request::{SpawnRequest, SpawnedAgent, WorkspaceMode};
use crate::orchestrator::{bootstrap, volume};
use crate::runtime::{ContainerRuntime, ContainerSpec};

/// Orchestrates the container lifecycle for one agent at a time.
///
/// Collaborators are injected at construction; the session establisher is
/// optional because some deployments drive the control protocol from a
/// separate process.
pub struct AgentOrchestrator {
    config: OrchestratorConfig,
    runtime: Arc<dyn ContainerRuntime>,
    env_loader: Arc<dyn EnvLoader>,
    descriptor_generator: Arc<dyn ServiceDescriptorGenerator>,
    session_establisher: Option<Arc<dyn SessionEstablisher>>,
}

impl AgentOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        runtime: Arc<dyn ContainerRuntime>,
        env_loader: Arc<dyn EnvLoader>,
        descriptor_generator: Arc<dyn ServiceDescriptorGenerator>,
        session_establisher: Option<Arc<dyn SessionEstablisher>>,
    ) -> Self {
        Self {
            config,
            runtime,
            env_loader,
            descriptor_generator,
            session_establisher,
        }
    }

    /// Spawn an agent container and establish its control session.
    ///
    /// Sequence: validate, provision the workspace (isolated mode only),
    /// compose environment and mounts, create and start the container, then
    /// establish the session. Per-step failure policy:
    ///
    /// - validation and volume provisioning are fatal before any container
    ///   exists;
    /// - workspace bootstrap failure is logged and tolerated (the agent
    ///   starts against the unpopulated volume, which stays reachable for
    ///   inspection);
    /// - session failure triggers a compensating force-removal of the
    ///   container that was just started.
    pub async fn spawn(&self, request: SpawnRequest) -> Result<SpawnedAgent, OrchestratorError> {
        let mode = request.workspace_mode()?;
        let agent_id = request.agent_id.as_str();

        // Workspace bind plus the host-side path the env loader and
        // descriptor generator see (empty in isolated mode).
        let (workspace_bind, host_workspace_path) = match &mode {
            WorkspaceMode::Isolated { repository, .. } => {
                let name = volume::ensure_volume(self.runtime.as_ref(), agent_id).await?;
                if let Err(e) = bootstrap::setup_workspace(
                    self.runtime.as_ref(),
                    &self.config,
                    agent_id,
                    repository,
                    &name,
                )
                .await
                {
                    tracing::warn!(
                        agent_id = %agent_id,
                        error = %e,
                        "workspace bootstrap failed; continuing with unpopulated volume"
                    );
                }
                (
                    BindSpec::rw(name, self.config.container_workspace.clone()),
                    String::new(),
                )
            }
            WorkspaceMode::Shared { path } => (
                BindSpec::rw(
                    path.display().to_string(),
                    self.config.container_workspace.clone(),
                ),
                path.display().to_string(),
            ),
        };

        let mut binds = vec![workspace_bind];
        binds.extend(build_git_binds(&self.config.host_home));

        let agent_type = request.agent_type.as_deref().unwrap_or("default");
        let mut env = vec![
            format!("AGENT_ID={agent_id}"),
            format!("TASK={}", request.task),
            format!("CONTROL_URL={}", self.config.control_url()),
            format!("AGENT_TYPE={agent_type}"),
        ];
        if let WorkspaceMode::Isolated { repository, .. } = &mode {
            env.push(format!("REPOSITORY={repository}"));
        }
        env.extend(self.env_loader.load_env_vars(&host_workspace_path).await);

        let manifest = self.descriptor_generator.generate(
            request.agent_type.as_deref(),
            &host_workspace_path,
            &DescriptorContext {
                agent_id: agent_id.to_string(),
                control_port: self.config.control_port,
            },
        );

        // The agent process talks over its tty/stdin channel after start,
        // so all three flags must be set at creation time.
        let spec = ContainerSpec {
            image: self.config.image.clone(),
            name: format!("agent-{agent_id}"),
            env,
            binds,
            cmd: None,
            working_dir: Some(self.config.container_workspace.clone()),
            tty: true,
            open_stdin: true,
            attach_stdin: true,
        };

        let container_id = self
            .runtime
            .create_container(&spec)
            .await
            .map_err(|e| OrchestratorError::ContainerCreate {
                agent_id: agent_id.to_string(),
                reason: e.to_string(),
            })?;

        self.runtime
            .start_container(&container_id)
            .await
            .map_err(|e| OrchestratorError::ContainerCreate {
                agent_id: agent_id.to_string(),
                reason: format!("failed to start container: {e}"),
            })?;

        let Some(establisher) = &self.session_establisher else {
            // TODO: the just-started container is left running on this
            // path; decide whether a missing establisher should trigger the
            // same compensating removal as a failed handshake.
            return Err(OrchestratorError::SessionEstablish {
                agent_id: agent_id.to_string(),
                reason: "no session establisher configured".to_string(),
            });
        };

        if let Err(session_err) = establisher
            .create_session(agent_id, &container_id, &manifest.descriptors)
            .await
        {
            // Compensating removal: best-effort, the session error is what
            // callers need to see.
            if let Err(remove_err) = self.runtime.remove_container(&container_id, true).await {
                tracing::warn!(
                    agent_id = %agent_id,
                    container_id = %container_id,
                    error = %remove_err,
                    "failed to remove container after session failure"
                );
            }
            return Err(OrchestratorError::SessionEstablish {
                agent_id: agent_id.to_string(),
                reason: session_err.to_string(),
            });
        }

        tracing::info!(
            agent_id = %agent_id,
            container_id = %container_id,
            "agent container started and session established"
        );

        Ok(SpawnedAgent {
            id: request.agent_id,
            task: request.task,
            container_id,
        })
    }

    /// Tear down an agent's persistent volume.
    ///
    /// Best-effort: never raises, whatever state the volume is in.
    pub async fn cleanup_agent(&self, agent_id: &str) {
        volume::remove_volume_best_effort(self.runtime.as_ref(), agent_id).await;
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
