//! Remote execution seam — install, uninstall, and probe.
//!
//! The transport (WinRM, SSH, agent) varies without touching the
//! orchestrator: implementations translate these calls into whatever
//! reaches the target machine. Calls are blocking; any retry or timeout
//! policy belongs to the implementation.

use anyhow::Result;

use fleetwave_state::ArtifactSpec;

/// Explicit result of a remote install/uninstall call.
///
/// Expected failures (package refused, access denied, machine offline)
/// come back as `Failure` with a reason; an `Err` from the trait method
/// is treated the same way by the callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Success,
    Failure(String),
}

/// Transport abstraction over the managed fleet.
pub trait RemoteExecutor: Send + Sync {
    /// Install the artifact on a target. One atomic call from the
    /// orchestrator's perspective.
    fn install(&self, target: &str, artifact: &ArtifactSpec) -> Result<ExecOutcome>;

    /// Remove the artifact from a target.
    fn uninstall(&self, target: &str, artifact: &ArtifactSpec) -> Result<ExecOutcome>;

    /// Whether the artifact is already present on a target.
    fn is_installed(&self, target: &str, artifact: &ArtifactSpec) -> Result<bool>;
}
