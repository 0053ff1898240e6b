//! Error types for the orchestrator core.
//!
//! Each enum maps to one failure domain. Every error that escapes a public
//! API carries the agent id and the failing step, with the underlying cause
//! preserved in the message. Nothing in this crate retries automatically;
//! retry policy belongs to callers.

/// Configuration and request-validation errors.
///
/// Raised before any container-runtime call is made, so a `ConfigError`
/// guarantees no resources were created.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("agent '{agent_id}' has neither a workspace path nor a repository URL")]
    MissingWorkspace { agent_id: String },

    #[error("invalid agent id '{agent_id}': {reason}")]
    InvalidAgentId { agent_id: String, reason: String },

    #[error("invalid value for {key}: {reason}")]
    InvalidEnvVar { key: String, reason: String },

    #[error("could not determine home directory for credential binds")]
    NoHomeDir,
}

/// Errors from the container-runtime boundary (Docker API calls and log
/// streams). Wrapped into a domain error before leaving the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("docker api error: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("log stream error: {0}")]
    Stream(String),

    #[error("{0}")]
    Other(String),
}

/// Failures of the workspace bootstrap (clone/pull into the agent volume).
///
/// These never abort a spawn: the orchestrator logs them and continues with
/// the unpopulated volume so the workspace stays reachable for inspection.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("workspace bootstrap failed for agent '{agent_id}': {reason}")]
    Failed { agent_id: String, reason: String },

    #[error("workspace bootstrap for agent '{agent_id}' timed out after {timeout_secs}s")]
    TimedOut { agent_id: String, timeout_secs: u64 },
}

/// Failure to establish the control session with a spawned agent.
///
/// Produced by [`SessionEstablisher`](crate::collaborators::SessionEstablisher)
/// implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("agent process unreachable: {0}")]
    Unreachable(String),

    #[error("session negotiation failed: {0}")]
    Negotiation(String),
}

/// Top-level error returned by [`AgentOrchestrator::spawn`](crate::orchestrator::AgentOrchestrator::spawn).
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to provision volume for agent '{agent_id}': {reason}")]
    Volume { agent_id: String, reason: String },

    #[error("failed to create container for agent '{agent_id}': {reason}")]
    ContainerCreate { agent_id: String, reason: String },

    #[error("failed to establish control session for agent '{agent_id}': {reason}")]
    SessionEstablish { agent_id: String, reason: String },

    #[error("docker connection failed: {reason}")]
    Docker { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_agent() {
        let err = OrchestratorError::Volume {
            agent_id: "a1".to_string(),
            reason: "volume store unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a1"));
        assert!(msg.contains("volume store unavailable"));
    }

    #[test]
    fn config_error_converts_transparently() {
        let err: OrchestratorError = ConfigError::MissingWorkspace {
            agent_id: "a1".to_string(),
        }
        .into();
        assert!(err.to_string().contains("neither a workspace path nor a repository URL"));
    }
}
