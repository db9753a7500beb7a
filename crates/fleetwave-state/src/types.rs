//! Domain types for the fleetwave run store.
//!
//! These types represent the persisted state of a rollout run: the
//! artifact being deployed, per-stage target results, and the rollback
//! record if the run was reversed. All types are serializable to/from
//! JSON for snapshot storage.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a rollout run.
pub type RunId = String;

/// Identifier for a managed machine/endpoint.
pub type TargetId = String;

// ── Artifact ──────────────────────────────────────────────────────

/// Identity of the software being rolled out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub package: String,
    pub version: String,
}

// ── Outcomes ──────────────────────────────────────────────────────

/// Per-target outcome of an install attempt.
///
/// `Skipped` means the artifact was already present; it counts as a
/// non-failure when the gate computes the stage success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed,
    Skipped,
}

/// Per-target outcome of an uninstall during rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackOutcome {
    Success,
    Failed,
}

// ── Results ───────────────────────────────────────────────────────

/// Recorded result of one install attempt against one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetResult {
    pub target: TargetId,
    /// Name of the stage this attempt belongs to.
    pub stage: String,
    pub outcome: Outcome,
    /// Error detail for `Failed` outcomes.
    pub error: Option<String>,
    /// Unix timestamp (seconds) when the result was recorded.
    pub recorded_at: u64,
}

/// Recorded result of one uninstall attempt during rollback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollbackRecord {
    pub target: TargetId,
    pub outcome: RollbackOutcome,
    pub error: Option<String>,
    pub recorded_at: u64,
}

/// All results recorded for one stage, in attempt order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageResults {
    pub stage: String,
    pub results: Vec<TargetResult>,
}

/// Rollback metadata stored on a reversed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollbackInfo {
    /// Human-readable reason supplied by the operator.
    pub reason: String,
    pub records: Vec<RollbackRecord>,
    pub rolled_back_at: u64,
}

// ── Run ───────────────────────────────────────────────────────────

/// Overall status of a rollout run.
///
/// Transitions are monotone except `Paused`/`PendingApproval`, which
/// return to `InProgress` on explicit resume at the same stage index.
/// `Completed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    InProgress,
    /// Gate failed; resumable at the same stage.
    Paused,
    /// Approval declined or unanswered; resumable at the same stage.
    PendingApproval,
    Completed,
    RolledBack,
}

impl RunStatus {
    /// Whether the run can never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::RolledBack)
    }

    /// Whether an explicit resume is permitted from this status.
    pub fn is_resumable(self) -> bool {
        matches!(self, RunStatus::Paused | RunStatus::PendingApproval)
    }
}

/// The durable snapshot of one rollout run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRun {
    pub id: RunId,
    pub artifact: ArtifactSpec,
    /// Unix timestamp (seconds) when the run was created.
    pub created_at: u64,
    /// Set when the run reaches `Completed`.
    pub completed_at: Option<u64>,
    /// Index of the stage currently being processed (or last processed).
    pub current_stage: usize,
    pub status: RunStatus,
    /// Per-stage result collections, in stage order.
    pub stages: Vec<StageResults>,
    /// Present once the run has been rolled back.
    pub rollback: Option<RollbackInfo>,
}

impl DeploymentRun {
    /// Create a fresh, not-yet-started run.
    pub fn new(id: impl Into<RunId>, artifact: ArtifactSpec) -> Self {
        Self {
            id: id.into(),
            artifact,
            created_at: epoch_secs(),
            completed_at: None,
            current_stage: 0,
            status: RunStatus::NotStarted,
            stages: Vec::new(),
            rollback: None,
        }
    }

    /// Every target id recorded anywhere in the run.
    ///
    /// This is the exclusion set for target selection: selection against
    /// it keeps a target from being attempted twice, including across a
    /// resume of a partially processed stage.
    pub fn attempted_targets(&self) -> HashSet<TargetId> {
        self.stages
            .iter()
            .flat_map(|s| s.results.iter())
            .map(|r| r.target.clone())
            .collect()
    }

    /// Latest outcome per target, in first-attempt order.
    ///
    /// Selection guarantees a target appears in at most one stage, but
    /// rollback still resolves the latest outcome in stage order so a
    /// hand-edited snapshot cannot trigger a double uninstall.
    pub fn latest_outcomes(&self) -> Vec<(TargetId, Outcome)> {
        let mut order: Vec<TargetId> = Vec::new();
        let mut latest: HashMap<TargetId, Outcome> = HashMap::new();
        for result in self.stages.iter().flat_map(|s| s.results.iter()) {
            if !latest.contains_key(&result.target) {
                order.push(result.target.clone());
            }
            latest.insert(result.target.clone(), result.outcome);
        }
        order
            .into_iter()
            .map(|t| {
                let outcome = latest[&t];
                (t, outcome)
            })
            .collect()
    }

    /// Targets whose latest outcome is `Success`, in first-attempt order.
    pub fn succeeded_targets(&self) -> Vec<TargetId> {
        self.latest_outcomes()
            .into_iter()
            .filter(|(_, o)| *o == Outcome::Success)
            .map(|(t, _)| t)
            .collect()
    }

    /// Ensure a result collection exists for the named stage, so a stage
    /// with zero attempted targets still appears in the snapshot.
    pub fn ensure_stage(&mut self, stage: &str) {
        if !self.stages.iter().any(|s| s.stage == stage) {
            self.stages.push(StageResults {
                stage: stage.to_string(),
                results: Vec::new(),
            });
        }
    }

    /// Results recorded for the named stage, empty if none.
    pub fn stage_results(&self, stage: &str) -> &[TargetResult] {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.results.as_slice())
            .unwrap_or(&[])
    }

    /// Append a result, enforcing at-most-once per target per stage.
    ///
    /// Returns false (and drops the result) if the target already has a
    /// result in that stage.
    pub fn record_result(&mut self, result: TargetResult) -> bool {
        self.ensure_stage(&result.stage);
        let entry = self
            .stages
            .iter_mut()
            .find(|s| s.stage == result.stage)
            .unwrap();
        if entry.results.iter().any(|r| r.target == result.target) {
            return false;
        }
        entry.results.push(result);
        true
    }
}

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_artifact() -> ArtifactSpec {
        ArtifactSpec {
            package: "corp-agent".to_string(),
            version: "2.1.0".to_string(),
        }
    }

    fn result(target: &str, stage: &str, outcome: Outcome) -> TargetResult {
        TargetResult {
            target: target.to_string(),
            stage: stage.to_string(),
            outcome,
            error: None,
            recorded_at: 1000,
        }
    }

    #[test]
    fn new_run_is_not_started() {
        let run = DeploymentRun::new("run-1", test_artifact());
        assert_eq!(run.status, RunStatus::NotStarted);
        assert_eq!(run.current_stage, 0);
        assert!(run.stages.is_empty());
        assert!(run.rollback.is_none());
    }

    #[test]
    fn record_result_rejects_duplicate_in_stage() {
        let mut run = DeploymentRun::new("run-1", test_artifact());
        assert!(run.record_result(result("m1", "pilot", Outcome::Success)));
        assert!(!run.record_result(result("m1", "pilot", Outcome::Failed)));
        assert_eq!(run.stage_results("pilot").len(), 1);
        assert_eq!(run.stage_results("pilot")[0].outcome, Outcome::Success);
    }

    #[test]
    fn attempted_targets_spans_all_stages() {
        let mut run = DeploymentRun::new("run-1", test_artifact());
        run.record_result(result("m1", "pilot", Outcome::Success));
        run.record_result(result("m2", "pilot", Outcome::Failed));
        run.record_result(result("m3", "phase1", Outcome::Skipped));

        let attempted = run.attempted_targets();
        assert_eq!(attempted.len(), 3);
        assert!(attempted.contains("m2"));
        assert!(attempted.contains("m3"));
    }

    #[test]
    fn succeeded_targets_excludes_failures_and_skips() {
        let mut run = DeploymentRun::new("run-1", test_artifact());
        run.record_result(result("m1", "pilot", Outcome::Success));
        run.record_result(result("m2", "pilot", Outcome::Failed));
        run.record_result(result("m3", "phase1", Outcome::Skipped));
        run.record_result(result("m4", "phase1", Outcome::Success));

        assert_eq!(run.succeeded_targets(), vec!["m1", "m4"]);
    }

    #[test]
    fn latest_outcome_wins_across_stages() {
        // Not producible through selection, but the rollback path must
        // honor the most recent outcome if it ever happens.
        let mut run = DeploymentRun::new("run-1", test_artifact());
        run.record_result(result("m1", "pilot", Outcome::Success));
        run.record_result(result("m1", "phase1", Outcome::Failed));

        assert!(run.succeeded_targets().is_empty());
    }

    #[test]
    fn ensure_stage_records_empty_stage() {
        let mut run = DeploymentRun::new("run-1", test_artifact());
        run.ensure_stage("pilot");
        run.ensure_stage("pilot");
        assert_eq!(run.stages.len(), 1);
        assert!(run.stage_results("pilot").is_empty());
    }

    #[test]
    fn status_terminality() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::RolledBack.is_terminal());
        assert!(!RunStatus::Paused.is_terminal());
        assert!(RunStatus::Paused.is_resumable());
        assert!(RunStatus::PendingApproval.is_resumable());
        assert!(!RunStatus::InProgress.is_resumable());
    }

    #[test]
    fn run_serializes_roundtrip() {
        let mut run = DeploymentRun::new("run-1", test_artifact());
        run.status = RunStatus::InProgress;
        run.record_result(TargetResult {
            target: "m2".to_string(),
            stage: "pilot".to_string(),
            outcome: Outcome::Failed,
            error: Some("access denied".to_string()),
            recorded_at: 1234,
        });

        let json = serde_json::to_string(&run).unwrap();
        let back: DeploymentRun = serde_json::from_str(&json).unwrap();
        assert_eq!(back, run);
        // Status serializes snake_case for dashboard consumers.
        assert!(json.contains("\"in_progress\""));
    }
}
