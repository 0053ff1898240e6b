//! Orchestrator configuration.
//!
//! Settings are resolved from env vars with defaults, in the order
//! env var > default. Nothing here touches Docker; resolution is pure
//! string parsing so it can run before any runtime connection exists.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for the agent orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Docker image for agent (and setup) containers.
    pub image: String,
    /// Port the control-protocol listener is reachable on from inside
    /// containers.
    pub control_port: u16,
    /// Path inside containers where the workspace is mounted.
    pub container_workspace: String,
    /// Host home directory scanned for git credential files.
    pub host_home: PathBuf,
    /// Upper bound on the workspace-bootstrap log drain, in seconds.
    pub bootstrap_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            image: "dockhand-agent:latest".to_string(),
            control_port: 8420,
            container_workspace: "/workspace".to_string(),
            host_home: PathBuf::new(),
            bootstrap_timeout_secs: 600,
        }
    }
}

impl OrchestratorConfig {
    /// Resolve configuration from env vars, falling back to defaults.
    ///
    /// `DOCKHAND_IMAGE`, `DOCKHAND_CONTROL_PORT`,
    /// `DOCKHAND_BOOTSTRAP_TIMEOUT_SECS`, and `DOCKHAND_HOST_HOME` are
    /// honored; the host home falls back to `dirs::home_dir()`.
    pub fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host_home = match optional_env("DOCKHAND_HOST_HOME") {
            Some(p) => PathBuf::from(p),
            None => dirs::home_dir().ok_or(ConfigError::NoHomeDir)?,
        };

        Ok(Self {
            image: string_env("DOCKHAND_IMAGE", &defaults.image),
            control_port: parse_env("DOCKHAND_CONTROL_PORT", defaults.control_port)?,
            container_workspace: string_env(
                "DOCKHAND_CONTAINER_WORKSPACE",
                &defaults.container_workspace,
            ),
            host_home,
            bootstrap_timeout_secs: parse_env(
                "DOCKHAND_BOOTSTRAP_TIMEOUT_SECS",
                defaults.bootstrap_timeout_secs,
            )?,
        })
    }

    /// Base URL of the control endpoint as seen from inside a container.
    pub fn control_url(&self) -> String {
        format!("http://{}:{}", control_host(), self.control_port)
    }

    /// URL of the mandatory messaging endpoint.
    pub fn messaging_url(&self) -> String {
        format!("{}/mcp", self.control_url())
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_secs)
    }
}

/// Host address containers use to reach the orchestrator process.
fn control_host() -> &'static str {
    if cfg!(target_os = "linux") {
        "172.17.0.1"
    } else {
        "host.docker.internal"
    }
}

/// Read an env var, treating unset and blank as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn string_env(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    parse_value(key, optional_env(key), default)
}

/// Testable core of [`parse_env`].
fn parse_value<T: std::str::FromStr>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_url_uses_configured_port() {
        let config = OrchestratorConfig {
            control_port: 9000,
            ..Default::default()
        };
        assert!(config.control_url().ends_with(":9000"));
        assert_eq!(config.messaging_url(), format!("{}/mcp", config.control_url()));
    }

    #[test]
    fn defaults_are_sane() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.container_workspace, "/workspace");
        assert_eq!(config.bootstrap_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn parse_value_rejects_garbage() {
        let result: Result<u16, _> =
            parse_value("DOCKHAND_CONTROL_PORT", Some("not-a-port".to_string()), 1);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("DOCKHAND_CONTROL_PORT"));
    }

    #[test]
    fn parse_value_falls_back_when_unset() {
        let port: u16 = parse_value("DOCKHAND_CONTROL_PORT", None, 8420).unwrap();
        assert_eq!(port, 8420);
    }
}
