//! Bind-mount specs and host git-credential binds.

use std::fmt;
use std::path::Path;

/// Mount mode for a bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    ReadOnly,
    ReadWrite,
}

impl BindMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

/// A `(host_source, container_target, mode)` bind triple.
///
/// Renders as the Docker `src:dst:mode` bind string. Ordering inside a bind
/// list carries no runtime meaning but is kept deterministic: workspace
/// first, then `.gitconfig`, then `.git-credentials`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSpec {
    pub host_source: String,
    pub container_target: String,
    pub mode: BindMode,
}

impl BindSpec {
    pub fn ro(host_source: impl Into<String>, container_target: impl Into<String>) -> Self {
        Self {
            host_source: host_source.into(),
            container_target: container_target.into(),
            mode: BindMode::ReadOnly,
        }
    }

    pub fn rw(host_source: impl Into<String>, container_target: impl Into<String>) -> Self {
        Self {
            host_source: host_source.into(),
            container_target: container_target.into(),
            mode: BindMode::ReadWrite,
        }
    }
}

impl fmt::Display for BindSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.host_source,
            self.container_target,
            self.mode.as_str()
        )
    }
}

/// Build read-only binds for the host's git credential files.
///
/// Emits one bind per file that exists under `home` (`.gitconfig`,
/// `.git-credentials`); a missing file is silently skipped, so an empty
/// result is a valid outcome, not an error. The home directory is an
/// explicit parameter rather than ambient state so tests can point it at a
/// temp dir.
pub fn build_git_binds(home: &Path) -> Vec<BindSpec> {
    let mut binds = Vec::new();

    let gitconfig = home.join(".gitconfig");
    if gitconfig.is_file() {
        binds.push(BindSpec::ro(gitconfig.display().to_string(), "/root/.gitconfig"));
    }

    let credentials = home.join(".git-credentials");
    if credentials.is_file() {
        binds.push(BindSpec::ro(
            credentials.display().to_string(),
            "/root/.git-credentials",
        ));
    }

    binds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_spec_renders_docker_form() {
        assert_eq!(
            BindSpec::rw("agent-a1-workspace", "/workspace").to_string(),
            "agent-a1-workspace:/workspace:rw"
        );
        assert_eq!(
            BindSpec::ro("/home/u/.gitconfig", "/root/.gitconfig").to_string(),
            "/home/u/.gitconfig:/root/.gitconfig:ro"
        );
    }

    #[test]
    fn empty_home_yields_no_binds() {
        let home = tempfile::tempdir().unwrap();
        assert!(build_git_binds(home.path()).is_empty());
    }

    #[test]
    fn gitconfig_alone_yields_exactly_one_bind() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".gitconfig"), "[user]\nname=t\n").unwrap();

        let binds = build_git_binds(home.path());
        assert_eq!(binds.len(), 1);
        assert_eq!(binds[0].container_target, "/root/.gitconfig");
        assert_eq!(binds[0].mode, BindMode::ReadOnly);
    }

    #[test]
    fn both_files_yield_deterministic_order() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".gitconfig"), "").unwrap();
        std::fs::write(home.path().join(".git-credentials"), "").unwrap();

        let binds = build_git_binds(home.path());
        assert_eq!(binds.len(), 2);
        assert_eq!(binds[0].container_target, "/root/.gitconfig");
        assert_eq!(binds[1].container_target, "/root/.git-credentials");
    }
}
