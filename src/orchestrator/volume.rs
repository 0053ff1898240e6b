//! Per-agent workspace volume provisioning.

use crate::error::OrchestratorError;
use crate::runtime::ContainerRuntime;

/// Deterministic volume name for an agent. Reused across cleanup/recreate
/// cycles so a respawned agent finds its previous workspace.
pub fn volume_name(agent_id: &str) -> String {
    format!("agent-{agent_id}-workspace")
}

/// Ensure the agent's workspace volume exists.
///
/// Idempotent: an existing volume is left untouched and no duplicate create
/// call is issued. Runtime failures wrap into
/// [`OrchestratorError::Volume`] and are never retried here.
pub(crate) async fn ensure_volume(
    runtime: &dyn ContainerRuntime,
    agent_id: &str,
) -> Result<String, OrchestratorError> {
    let name = volume_name(agent_id);

    let existing = runtime
        .list_volume_names()
        .await
        .map_err(|e| OrchestratorError::Volume {
            agent_id: agent_id.to_string(),
            reason: e.to_string(),
        })?;

    if !existing.iter().any(|v| v == &name) {
        runtime
            .create_volume(&name)
            .await
            .map_err(|e| OrchestratorError::Volume {
                agent_id: agent_id.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(agent_id = %agent_id, volume = %name, "created workspace volume");
    }

    Ok(name)
}

/// Best-effort removal of the agent's volume. Failures (volume in use,
/// already absent) are logged and swallowed.
pub(crate) async fn remove_volume_best_effort(runtime: &dyn ContainerRuntime, agent_id: &str) {
    let name = volume_name(agent_id);
    match runtime.remove_volume(&name).await {
        Ok(()) => tracing::info!(agent_id = %agent_id, volume = %name, "removed workspace volume"),
        Err(e) => {
            tracing::warn!(
                agent_id = %agent_id,
                volume = %name,
                error = %e,
                "failed to remove workspace volume (may be in use or already gone)"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_name_is_deterministic() {
        assert_eq!(volume_name("a1"), "agent-a1-workspace");
        assert_eq!(volume_name("a1"), volume_name("a1"));
    }
}
