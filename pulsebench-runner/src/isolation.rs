//! Process Isolation Contract
//!
//! In-process execution is built in; process isolation is delegated to an
//! external collaborator implementing `ProcessLauncher`. The harness itself
//! never spawns processes. When a unit resolves to process isolation and no
//! launcher is installed, the unit is reported as failed with an isolation
//! error rather than silently downgraded to in-process execution.

use pulsebench_core::{LaunchOutcome, RunConfig};
use thiserror::Error;

/// Errors surfaced by a process-launch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsolationError {
    /// Process isolation was requested but no launcher is installed.
    #[error("process isolation requested for '{unit}' but no process launcher is installed")]
    Unavailable {
        /// The unit that requested isolation.
        unit: String,
    },

    /// The launcher failed to start the isolated context.
    #[error("failed to spawn isolated launch: {0}")]
    Spawn(String),

    /// The isolated context produced an unusable or truncated result.
    #[error("isolated launch returned a malformed result: {0}")]
    Protocol(String),
}

/// External collaborator that runs one launch in a fresh execution context.
///
/// Implementations own process spawning and result transport; the harness
/// only consumes the resulting `LaunchOutcome`, treating it exactly like an
/// in-process one.
pub trait ProcessLauncher {
    /// Run launch `index` of the named unit under `config` in a fresh
    /// execution context and return its outcome.
    fn launch(
        &self,
        unit_name: &str,
        config: &RunConfig,
        index: u32,
    ) -> Result<LaunchOutcome, IsolationError>;
}
