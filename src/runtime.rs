//! Container-runtime boundary.
//!
//! Everything the orchestrator needs from Docker is expressed as the
//! [`ContainerRuntime`] capability trait: volume list/create/remove plus
//! container create/start/logs/remove. Production code uses [`DockerRuntime`]
//! (bollard); tests substitute an in-memory fake without touching a daemon.

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions,
};
use bollard::models::HostConfig;
use bollard::volume::CreateVolumeOptions;
use tokio_stream::StreamExt;

use crate::error::RuntimeError;
use crate::orchestrator::binds::BindSpec;

/// Everything needed to create a container.
///
/// The stdio flags matter: agent containers are created with a pseudo-tty
/// and stdin held open and attached, because the in-container process
/// communicates over that channel after start. Setup containers leave all
/// three off.
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
    pub env: Vec<String>,
    pub binds: Vec<BindSpec>,
    /// Override the image entrypoint command (setup containers only).
    pub cmd: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub tty: bool,
    pub open_stdin: bool,
    pub attach_stdin: bool,
}

/// Capability interface over the container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Names of all volumes known to the runtime.
    async fn list_volume_names(&self) -> Result<Vec<String>, RuntimeError>;

    async fn create_volume(&self, name: &str) -> Result<(), RuntimeError>;

    async fn remove_volume(&self, name: &str) -> Result<(), RuntimeError>;

    /// Create a container and return its runtime-assigned id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Follow the container's combined stdout/stderr stream until it ends.
    ///
    /// Resolves when the stream signals completion (the container's main
    /// process exited); a stream-error event fails the call.
    async fn drain_logs(&self, id: &str) -> Result<(), RuntimeError>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), RuntimeError>;

    /// Whether the container's main process is currently running.
    async fn container_running(&self, id: &str) -> Result<bool, RuntimeError>;
}

/// Connect to the local Docker daemon and verify it responds.
pub async fn connect_docker() -> Result<Docker, bollard::errors::Error> {
    let docker = Docker::connect_with_local_defaults()?;
    docker.ping().await?;
    Ok(docker)
}

/// [`ContainerRuntime`] backed by the local Docker daemon.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect to the local daemon and wrap it.
    pub async fn connect() -> Result<Self, bollard::errors::Error> {
        Ok(Self::new(connect_docker().await?))
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_volume_names(&self) -> Result<Vec<String>, RuntimeError> {
        let response = self
            .docker
            .list_volumes(None::<bollard::volume::ListVolumesOptions<String>>)
            .await?;
        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.name)
            .collect())
    }

    async fn create_volume(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .create_volume(CreateVolumeOptions {
                name: name.to_string(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker.remove_volume(name, None).await?;
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let binds: Vec<String> = spec.binds.iter().map(ToString::to_string).collect();

        let host_config = HostConfig {
            binds: if binds.is_empty() { None } else { Some(binds) },
            ..Default::default()
        };

        let container_config = Config {
            image: Some(spec.image.clone()),
            cmd: spec.cmd.clone(),
            env: Some(spec.env.clone()),
            host_config: Some(host_config),
            working_dir: spec.working_dir.clone(),
            tty: Some(spec.tty),
            open_stdin: Some(spec.open_stdin),
            attach_stdin: Some(spec.attach_stdin),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await?;
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker.start_container::<String>(id, None).await?;
        Ok(())
    }

    async fn drain_logs(&self, id: &str) -> Result<(), RuntimeError> {
        let mut stream = self.docker.logs(
            id,
            Some(LogsOptions::<String> {
                follow: true,
                stdout: true,
                stderr: true,
                ..Default::default()
            }),
        );

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(output) => {
                    tracing::debug!(container_id = %id, "{}", output);
                }
                Err(e) => return Err(RuntimeError::Stream(e.to_string())),
            }
        }
        Ok(())
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    async fn container_running(&self, id: &str) -> Result<bool, RuntimeError> {
        let inspect = self.docker.inspect_container(id, None).await?;
        Ok(inspect
            .state
            .and_then(|s| s.running)
            .unwrap_or(false))
    }
}
