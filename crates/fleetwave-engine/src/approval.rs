//! Approval seam — the human-in-the-loop gate between stages.

use anyhow::Result;

/// A synchronous approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Decline,
}

/// Source of stage-advance approvals (console prompt, ticketing webhook,
/// message queue).
///
/// There is no automatic timeout: not responding is the implementation's
/// problem, and an `Err` from the provider is treated as a decline so an
/// unreachable approver pauses the pipeline instead of advancing it.
pub trait ApprovalProvider: Send + Sync {
    /// Ask whether the rollout may advance past the named stage, given
    /// the stage's observed success rate.
    fn request_approval(&self, stage: &str, success_rate: f64) -> Result<ApprovalDecision>;
}
