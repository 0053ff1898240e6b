//! dockhand: container lifecycle orchestration for autonomous agents.
//!
//! Given a [`SpawnRequest`](orchestrator::SpawnRequest), dockhand provisions
//! an isolated execution environment (a container plus either a shared host
//! directory or a per-agent volume seeded from a git repository), wires the
//! environment and auxiliary service endpoints the agent process needs,
//! starts the container, and establishes the external control session the
//! agent requires to receive work, rolling the container back if that
//! session cannot be established.
//!
//! The control-session protocol, descriptor generation rules, and env-var
//! discovery are injected collaborators (see [`collaborators`]); the Docker
//! surface is behind the [`runtime::ContainerRuntime`] capability trait.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod runtime;

pub use collaborators::{
    DefaultDescriptorGenerator, DescriptorContext, DotEnvLoader, EnvLoader,
    ProbeSessionEstablisher, ServiceDescriptor, ServiceDescriptorGenerator, ServiceManifest,
    SessionEstablisher,
};
pub use config::OrchestratorConfig;
pub use error::{BootstrapError, ConfigError, OrchestratorError, RuntimeError, SessionError};
pub use orchestrator::{AgentOrchestrator, SpawnRequest, SpawnedAgent, WorkspaceMode};
pub use runtime::{ContainerRuntime, ContainerSpec, DockerRuntime, connect_docker};
