//! Stage plans — how a rollout is divided into gated phases.
//!
//! A plan is an ordered list of `StageSpec`s passed explicitly into the
//! orchestrator; there is no global stage table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use fleetwave_state::TargetId;

use crate::error::{EngineError, EngineResult};

/// How a stage resolves its target set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectorSpec {
    /// A fixed list of target identifiers.
    Explicit { targets: Vec<TargetId> },
    /// A percentage (1–100) of the eligible candidate pool, sampled
    /// uniformly without replacement.
    Percentage { percent: u32 },
}

/// One named phase of a rollout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageSpec {
    pub name: String,
    /// Position within the rollout; must be strictly increasing.
    pub ordinal: u32,
    pub selector: SelectorSpec,
    /// Success-rate threshold in [0, 1] required to pass the gate.
    pub threshold: f64,
}

/// Validate a stage plan before a run starts or resumes.
pub fn validate_stages(stages: &[StageSpec]) -> EngineResult<()> {
    if stages.is_empty() {
        return Err(EngineError::InvalidPlan("no stages defined".to_string()));
    }

    let mut names = HashSet::new();
    let mut prev_ordinal: Option<u32> = None;

    for stage in stages {
        if stage.name.is_empty() {
            return Err(EngineError::InvalidPlan("stage with empty name".to_string()));
        }
        if !names.insert(stage.name.as_str()) {
            return Err(EngineError::InvalidPlan(format!(
                "duplicate stage name: {}",
                stage.name
            )));
        }
        if let Some(prev) = prev_ordinal {
            if stage.ordinal <= prev {
                return Err(EngineError::InvalidPlan(format!(
                    "stage {} ordinal {} not strictly increasing",
                    stage.name, stage.ordinal
                )));
            }
        }
        prev_ordinal = Some(stage.ordinal);

        if !(0.0..=1.0).contains(&stage.threshold) {
            return Err(EngineError::InvalidPlan(format!(
                "stage {} threshold {} outside [0, 1]",
                stage.name, stage.threshold
            )));
        }
        match &stage.selector {
            SelectorSpec::Explicit { targets } if targets.is_empty() => {
                return Err(EngineError::InvalidPlan(format!(
                    "stage {} has an empty explicit target list",
                    stage.name
                )));
            }
            SelectorSpec::Percentage { percent } if !(1..=100).contains(percent) => {
                return Err(EngineError::InvalidPlan(format!(
                    "stage {} percent {} outside 1–100",
                    stage.name, percent
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
