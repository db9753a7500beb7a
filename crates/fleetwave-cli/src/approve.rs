//! Console approval provider.

use anyhow::Result;
use dialoguer::Confirm;
use tracing::info;

use fleetwave_engine::{ApprovalDecision, ApprovalProvider};

/// Asks the operator on the terminal; `assume_yes` answers for them
/// (scripted/non-interactive runs).
pub struct ConsoleApproval {
    assume_yes: bool,
}

impl ConsoleApproval {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ApprovalProvider for ConsoleApproval {
    fn request_approval(&self, stage: &str, success_rate: f64) -> Result<ApprovalDecision> {
        if self.assume_yes {
            info!(%stage, "approval auto-granted (assume_yes)");
            return Ok(ApprovalDecision::Approve);
        }

        let approved = Confirm::new()
            .with_prompt(format!(
                "Stage '{stage}' finished with {:.1}% success. Continue to the next stage?",
                success_rate * 100.0
            ))
            .default(false)
            .interact()?;

        Ok(if approved {
            ApprovalDecision::Approve
        } else {
            ApprovalDecision::Decline
        })
    }
}
