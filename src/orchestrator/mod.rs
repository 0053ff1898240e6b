//! Agent container lifecycle orchestration.
//!
//! One `spawn` call is a single sequential chain of suspending operations
//! with per-step failure policy:
//!
//! ```text
//! SpawnRequest
//!   │ validate (ConfigError: nothing created)
//!   ▼
//! WorkspaceMode
//!   ├─ Isolated ─▶ ensure_volume (fatal)
//!   │              └▶ setup_workspace (failure logged, spawn continues)
//!   └─ Shared ───▶ host path bound directly
//!   ▼
//! compose env + descriptors + mounts
//!   ▼
//! create + start agent container (tty, stdin open/attached)
//!   ▼
//! establish control session
//!   ├─ ok ──────▶ SpawnedAgent { id, task, container_id }
//!   └─ failure ─▶ force-remove container, SessionEstablishError
//! ```
//!
//! Volumes and containers are namespaced by agent id, so concurrent spawns
//! for distinct agents never contend and no locking is needed.

pub mod binds;
pub mod bootstrap;
pub mod request;
pub mod spawner;
pub mod volume;

pub use binds::{BindMode, BindSpec, build_git_binds};
pub use bootstrap::branch_name;
pub use request::{SpawnRequest, SpawnedAgent, WorkspaceMode};
pub use spawner::AgentOrchestrator;
pub use volume::volume_name;
