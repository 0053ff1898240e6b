//! Spawn request and derived workspace mode.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::orchestrator::volume;

/// Request to spawn one agent.
///
/// At least one of `workspace` / `repository` must be present. When both
/// are given, `repository` wins and the agent runs in an isolated volume;
/// the precedence is resolved once by [`SpawnRequest::workspace_mode`] so
/// nothing downstream re-checks the optionals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub agent_id: String,
    /// Task description handed to the agent via `TASK`.
    pub task: String,
    /// Host directory to bind-mount directly (shared mode).
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    /// Git repository URL to seed a per-agent volume from (isolated mode).
    #[serde(default)]
    pub repository: Option<String>,
    /// Agent type forwarded to the descriptor generator; `"default"` if unset.
    #[serde(default)]
    pub agent_type: Option<String>,
}

/// How the agent's workspace is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceMode {
    /// Host directory bind-mounted directly, shared across agents.
    Shared { path: PathBuf },
    /// Per-agent named volume seeded from a cloned repository.
    Isolated { volume: String, repository: String },
}

impl SpawnRequest {
    /// Validate the request and derive the workspace mode.
    ///
    /// Runs before any container-runtime call: a `ConfigError` from here
    /// guarantees no resources were touched.
    pub fn workspace_mode(&self) -> Result<WorkspaceMode, ConfigError> {
        validate_agent_id(&self.agent_id)?;
        if let Some(repository) = &self.repository {
            return Ok(WorkspaceMode::Isolated {
                volume: volume::volume_name(&self.agent_id),
                repository: repository.clone(),
            });
        }
        match &self.workspace {
            Some(path) => Ok(WorkspaceMode::Shared { path: path.clone() }),
            None => Err(ConfigError::MissingWorkspace {
                agent_id: self.agent_id.clone(),
            }),
        }
    }
}

/// Reject agent ids that cannot safely name a volume, container, and git
/// branch. The id reaches the setup container's environment, so the charset
/// is kept strict.
fn validate_agent_id(agent_id: &str) -> Result<(), ConfigError> {
    if agent_id.is_empty() {
        return Err(ConfigError::InvalidAgentId {
            agent_id: agent_id.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if let Some(bad) = agent_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(ConfigError::InvalidAgentId {
            agent_id: agent_id.to_string(),
            reason: format!("character '{bad}' is not allowed"),
        });
    }
    Ok(())
}

/// The artifact returned to callers for a successfully spawned agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedAgent {
    pub id: String,
    pub task: String,
    /// Runtime-assigned container id; authoritative and opaque.
    pub container_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(workspace: Option<&str>, repository: Option<&str>) -> SpawnRequest {
        SpawnRequest {
            agent_id: "a1".to_string(),
            task: "t".to_string(),
            workspace: workspace.map(PathBuf::from),
            repository: repository.map(String::from),
            agent_type: None,
        }
    }

    #[test]
    fn neither_workspace_nor_repository_is_rejected() {
        let err = request(None, None).workspace_mode().unwrap_err();
        assert!(matches!(err, ConfigError::MissingWorkspace { .. }));
        assert!(err.to_string().contains("a1"));
    }

    #[test]
    fn repository_takes_precedence_over_workspace() {
        let mode = request(Some("/tmp/shared"), Some("https://x/y.git"))
            .workspace_mode()
            .unwrap();
        assert_eq!(
            mode,
            WorkspaceMode::Isolated {
                volume: "agent-a1-workspace".to_string(),
                repository: "https://x/y.git".to_string(),
            }
        );
    }

    #[test]
    fn workspace_alone_selects_shared_mode() {
        let mode = request(Some("/srv/code"), None).workspace_mode().unwrap();
        assert_eq!(
            mode,
            WorkspaceMode::Shared {
                path: PathBuf::from("/srv/code")
            }
        );
    }

    #[test]
    fn hostile_agent_ids_are_rejected() {
        for bad in ["", "a b", "a;rm -rf /", "a/../b", "$(whoami)"] {
            let mut req = request(Some("/tmp"), None);
            req.agent_id = bad.to_string();
            assert!(
                req.workspace_mode().is_err(),
                "agent id {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn dotted_and_dashed_ids_are_allowed() {
        for ok in ["a1", "agent-7", "team.bot_3"] {
            let mut req = request(Some("/tmp"), None);
            req.agent_id = ok.to_string();
            assert!(req.workspace_mode().is_ok());
        }
    }
}
