//! Gate controller — the go/no-go decision after each stage.
//!
//! Compares the stage's observed success rate against its threshold and,
//! between stages, consults the approval provider when one is configured.

use tracing::{info, warn};

use fleetwave_state::{Outcome, TargetResult};

use crate::approval::{ApprovalDecision, ApprovalProvider};
use crate::plan::StageSpec;

/// Outcome of evaluating a stage gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Rate met the threshold (and approval, if required, was granted).
    Advance,
    /// Rate below threshold; the run pauses at this stage.
    Pause,
    /// Approval declined or unavailable; the run waits at this stage.
    AwaitApproval,
}

/// Stage success rate: `(#Success + #Skipped) / #Total`.
///
/// A stage with zero attempted targets is treated as vacuously
/// compliant (`1.0`).
pub fn success_rate(results: &[TargetResult]) -> f64 {
    if results.is_empty() {
        return 1.0;
    }
    let passing = results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Success | Outcome::Skipped))
        .count();
    passing as f64 / results.len() as f64
}

/// Evaluate the gate for a stage.
///
/// `approval` is consulted only between stages (never after the final
/// one); a provider error is treated as a decline so an unreachable
/// approver stops the pipeline rather than advancing it.
pub fn evaluate(
    stage: &StageSpec,
    rate: f64,
    is_final: bool,
    approval: Option<&dyn ApprovalProvider>,
) -> GateDecision {
    if rate < stage.threshold {
        warn!(
            stage = %stage.name,
            rate,
            threshold = stage.threshold,
            "gate failed, pausing rollout"
        );
        return GateDecision::Pause;
    }

    if !is_final {
        if let Some(provider) = approval {
            match provider.request_approval(&stage.name, rate) {
                Ok(ApprovalDecision::Approve) => {
                    info!(stage = %stage.name, rate, "stage approved");
                }
                Ok(ApprovalDecision::Decline) => {
                    info!(stage = %stage.name, "approval declined");
                    return GateDecision::AwaitApproval;
                }
                Err(e) => {
                    warn!(stage = %stage.name, error = %e, "approval unavailable, treating as decline");
                    return GateDecision::AwaitApproval;
                }
            }
        }
    }

    info!(stage = %stage.name, rate, "gate passed");
    GateDecision::Advance
}
