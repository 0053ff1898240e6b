//! Injected collaborator interfaces.
//!
//! The orchestrator composes three externally supplied capabilities: an
//! environment loader, a service-descriptor generator, and a session
//! establisher. Each is a trait object passed at construction so callers
//! (and tests) can substitute their own implementations without touching
//! the spawn path. Default implementations suitable for local use ship
//! alongside the traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OrchestratorConfig;
use crate::error::SessionError;
use crate::runtime::ContainerRuntime;

/// A named auxiliary-service endpoint handed to the agent's control session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub url: String,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// The descriptor set produced for one agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceManifest {
    pub descriptors: Vec<ServiceDescriptor>,
}

/// Spawn context passed to the descriptor generator.
#[derive(Debug, Clone)]
pub struct DescriptorContext {
    pub agent_id: String,
    pub control_port: u16,
}

/// Loads extra KEY=VALUE environment entries for a workspace.
///
/// Called with an empty path in isolated mode (there is no host-side
/// workspace directory to scan). Absence of configuration is a valid,
/// silent outcome, so the loader is infallible.
#[async_trait]
pub trait EnvLoader: Send + Sync {
    async fn load_env_vars(&self, workspace_path: &str) -> Vec<String>;
}

/// Produces the auxiliary-service descriptors for an agent.
///
/// Contract: the returned manifest always contains a `"messaging"`
/// descriptor pointing at the control endpoint's `/mcp` route, regardless
/// of agent type.
pub trait ServiceDescriptorGenerator: Send + Sync {
    fn generate(
        &self,
        agent_type: Option<&str>,
        workspace_path: &str,
        context: &DescriptorContext,
    ) -> ServiceManifest;
}

/// Establishes the control-protocol session with a started agent container.
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    async fn create_session(
        &self,
        agent_id: &str,
        container_id: &str,
        descriptors: &[ServiceDescriptor],
    ) -> Result<(), SessionError>;
}

/// [`EnvLoader`] that reads `<workspace>/.env` when present.
///
/// Missing file, empty path, or a malformed file all resolve to no entries.
#[derive(Debug, Clone, Default)]
pub struct DotEnvLoader;

#[async_trait]
impl EnvLoader for DotEnvLoader {
    async fn load_env_vars(&self, workspace_path: &str) -> Vec<String> {
        if workspace_path.is_empty() {
            return Vec::new();
        }
        let path = std::path::Path::new(workspace_path).join(".env");
        let iter = match dotenvy::from_path_iter(&path) {
            Ok(iter) => iter,
            Err(_) => return Vec::new(),
        };
        let mut entries = Vec::new();
        for item in iter {
            match item {
                Ok((key, value)) => entries.push(format!("{key}={value}")),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed .env entry");
                }
            }
        }
        entries
    }
}

/// [`ServiceDescriptorGenerator`] that emits only the mandatory messaging
/// descriptor.
#[derive(Debug, Clone)]
pub struct DefaultDescriptorGenerator {
    messaging_url: String,
}

impl DefaultDescriptorGenerator {
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            messaging_url: config.messaging_url(),
        }
    }
}

impl ServiceDescriptorGenerator for DefaultDescriptorGenerator {
    fn generate(
        &self,
        _agent_type: Option<&str>,
        _workspace_path: &str,
        _context: &DescriptorContext,
    ) -> ServiceManifest {
        ServiceManifest {
            descriptors: vec![ServiceDescriptor::new("messaging", self.messaging_url.clone())],
        }
    }
}

/// [`SessionEstablisher`] that verifies the agent process actually came up.
///
/// A real control-protocol handshake lives outside this crate; this probe
/// covers the local-CLI case by polling the container state a few times and
/// treating an exited container as an unreachable agent.
pub struct ProbeSessionEstablisher {
    runtime: Arc<dyn ContainerRuntime>,
    attempts: u32,
    interval: Duration,
}

impl ProbeSessionEstablisher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            attempts: 5,
            interval: Duration::from_millis(200),
        }
    }
}

#[async_trait]
impl SessionEstablisher for ProbeSessionEstablisher {
    async fn create_session(
        &self,
        agent_id: &str,
        container_id: &str,
        descriptors: &[ServiceDescriptor],
    ) -> Result<(), SessionError> {
        tracing::debug!(
            agent_id = %agent_id,
            descriptors = descriptors.len(),
            "probing agent container before handing over descriptors"
        );
        let mut last_err = String::new();
        for _ in 0..self.attempts {
            match self.runtime.container_running(container_id).await {
                Ok(true) => return Ok(()),
                Ok(false) => last_err = "container is not running".to_string(),
                Err(e) => last_err = e.to_string(),
            }
            tokio::time::sleep(self.interval).await;
        }
        Err(SessionError::Unreachable(last_err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generator_always_yields_messaging() {
        let config = OrchestratorConfig {
            control_port: 9100,
            ..Default::default()
        };
        let generator = DefaultDescriptorGenerator::new(&config);
        let context = DescriptorContext {
            agent_id: "a1".to_string(),
            control_port: config.control_port,
        };

        for agent_type in [None, Some("default"), Some("researcher")] {
            let manifest = generator.generate(agent_type, "", &context);
            let messaging = manifest
                .descriptors
                .iter()
                .find(|d| d.name == "messaging")
                .expect("messaging descriptor missing");
            assert!(messaging.url.ends_with(":9100/mcp"));
        }
    }

    #[tokio::test]
    async fn dotenv_loader_reads_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "FOO=bar\nBAZ=qux\n").unwrap();

        let entries = DotEnvLoader.load_env_vars(dir.path().to_str().unwrap()).await;
        assert_eq!(entries, vec!["FOO=bar".to_string(), "BAZ=qux".to_string()]);
    }

    #[tokio::test]
    async fn dotenv_loader_is_silent_on_absence() {
        assert!(DotEnvLoader.load_env_vars("").await.is_empty());

        let dir = tempfile::tempdir().unwrap();
        assert!(
            DotEnvLoader
                .load_env_vars(dir.path().to_str().unwrap())
                .await
                .is_empty()
        );
    }
}
