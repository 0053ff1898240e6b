//! Workspace bootstrap: seed an agent's volume from a git repository.
//!
//! Runs a disposable setup container built from the agent image with the
//! target volume mounted at the workspace path. The script text is a
//! constant; the repository URL and branch name travel as environment
//! variables so caller-supplied input is never spliced into shell grammar.

use crate::config::OrchestratorConfig;
use crate::error::BootstrapError;
use crate::orchestrator::binds::{BindSpec, build_git_binds};
use crate::runtime::{ContainerRuntime, ContainerSpec};

/// Deterministic per-agent branch name, so each agent's in-volume checkout
/// stays isolated even when the volume is reused.
pub fn branch_name(agent_id: &str) -> String {
    format!("agent-{agent_id}")
}

/// Clone-or-update script run inside the setup container.
///
/// A stale clone that fails to pull must not abort the run, hence the
/// trailing `|| true` on the update path; both conventional primary-branch
/// names are tried. The final line creates the agent branch, or switches to
/// it when the volume already carries one from a previous run.
const SETUP_SCRIPT: &str = r#"set -e
cd "$WORKSPACE_DIR"
if [ -d .git ]; then
    git pull origin main || git pull origin master || true
else
    git clone "$REPO_URL" .
fi
git checkout -b "$AGENT_BRANCH" 2>/dev/null || git checkout "$AGENT_BRANCH"
"#;

/// Clone/update `repository` into `volume` and check out the agent branch.
///
/// Completion model: create and start the setup container, follow its
/// combined output stream until it ends (bounded by the configured
/// timeout), then remove the container. Create failures, stream errors,
/// the timeout, and removal failures all wrap into [`BootstrapError`];
/// the script's own exit status is not inspected; a failed clone simply
/// leaves the volume unpopulated, which the spawn path tolerates.
pub(crate) async fn setup_workspace(
    runtime: &dyn ContainerRuntime,
    config: &OrchestratorConfig,
    agent_id: &str,
    repository: &str,
    volume: &str,
) -> Result<(), BootstrapError> {
    let failed = |reason: String| BootstrapError::Failed {
        agent_id: agent_id.to_string(),
        reason,
    };

    let mut binds = vec![BindSpec::rw(volume, config.container_workspace.clone())];
    binds.extend(build_git_binds(&config.host_home));

    let spec = ContainerSpec {
        image: config.image.clone(),
        name: format!("agent-{agent_id}-setup"),
        env: vec![
            format!("WORKSPACE_DIR={}", config.container_workspace),
            format!("REPO_URL={repository}"),
            format!("AGENT_BRANCH={}", branch_name(agent_id)),
        ],
        binds,
        cmd: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            SETUP_SCRIPT.to_string(),
        ]),
        working_dir: Some(config.container_workspace.clone()),
        ..Default::default()
    };

    let container_id = runtime
        .create_container(&spec)
        .await
        .map_err(|e| failed(format!("setup container creation failed: {e}")))?;

    runtime
        .start_container(&container_id)
        .await
        .map_err(|e| failed(format!("setup container start failed: {e}")))?;

    tracing::debug!(
        agent_id = %agent_id,
        container_id = %container_id,
        repository = %repository,
        "running workspace setup container"
    );

    let timeout = config.bootstrap_timeout();
    match tokio::time::timeout(timeout, runtime.drain_logs(&container_id)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            remove_setup_container(runtime, agent_id, &container_id).await;
            return Err(failed(format!("setup log stream failed: {e}")));
        }
        Err(_) => {
            remove_setup_container(runtime, agent_id, &container_id).await;
            return Err(BootstrapError::TimedOut {
                agent_id: agent_id.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    }

    runtime
        .remove_container(&container_id, false)
        .await
        .map_err(|e| failed(format!("setup container removal failed: {e}")))?;

    Ok(())
}

/// Force-remove a setup container after a stream error or timeout. Purely
/// best-effort; the caller is already returning the primary error.
async fn remove_setup_container(runtime: &dyn ContainerRuntime, agent_id: &str, container_id: &str) {
    if let Err(e) = runtime.remove_container(container_id, true).await {
        tracing::warn!(
            agent_id = %agent_id,
            container_id = %container_id,
            error = %e,
            "failed to remove setup container"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_name_is_deterministic() {
        assert_eq!(branch_name("a1"), "agent-a1");
    }

    #[test]
    fn setup_script_never_interpolates_caller_input() {
        // Untrusted values only ever appear as env-var references.
        assert!(SETUP_SCRIPT.contains("\"$REPO_URL\""));
        assert!(SETUP_SCRIPT.contains("\"$AGENT_BRANCH\""));
        assert!(SETUP_SCRIPT.contains("git pull origin main || git pull origin master || true"));
    }
}
