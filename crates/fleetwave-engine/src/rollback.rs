//! Rollback — reverse a run's successful installs, best-effort.
//!
//! Runs independently of the orchestrator: it loads a persisted run,
//! uninstalls every target whose latest outcome was `Success`, records a
//! `RollbackRecord` per attempt, and never lets one unreachable target
//! stop the rest. The result is a mixed-outcome summary, not an
//! all-or-nothing transaction.

use std::sync::Arc;

use tracing::{info, warn};

use fleetwave_state::{
    epoch_secs, RollbackInfo, RollbackOutcome, RollbackRecord, RunStatus, RunStore,
};

use crate::error::{EngineError, EngineResult};
use crate::remote::{ExecOutcome, RemoteExecutor};

/// Counts reported after a rollback finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackSummary {
    pub run_id: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Reverses persisted runs.
pub struct RollbackExecutor {
    store: RunStore,
    remote: Arc<dyn RemoteExecutor>,
}

impl RollbackExecutor {
    pub fn new(store: RunStore, remote: Arc<dyn RemoteExecutor>) -> Self {
        Self { store, remote }
    }

    /// Roll back every successful install of the identified run.
    ///
    /// Fails fast if the run is unknown or already rolled back; per-target
    /// uninstall failures are recorded and logged but do not halt the
    /// remaining targets. The run ends `RolledBack` either way.
    pub fn rollback(&self, run_id: &str, reason: &str) -> EngineResult<RollbackSummary> {
        let mut run = self.store.load(run_id)?;
        if run.status == RunStatus::RolledBack {
            return Err(EngineError::AlreadyRolledBack(run.id));
        }

        let targets = run.succeeded_targets();
        info!(
            %run_id,
            targets = targets.len(),
            %reason,
            "rollback started"
        );

        let mut records = Vec::with_capacity(targets.len());
        for target in &targets {
            let (outcome, error) = match self.remote.uninstall(target, &run.artifact) {
                Ok(ExecOutcome::Success) => (RollbackOutcome::Success, None),
                Ok(ExecOutcome::Failure(r)) => {
                    warn!(%target, reason = %r, "uninstall failed");
                    (RollbackOutcome::Failed, Some(r))
                }
                Err(e) => {
                    warn!(%target, error = %e, "uninstall call failed");
                    (RollbackOutcome::Failed, Some(e.to_string()))
                }
            };
            records.push(RollbackRecord {
                target: target.clone(),
                outcome,
                error,
                recorded_at: epoch_secs(),
            });
        }

        let summary = RollbackSummary {
            run_id: run.id.clone(),
            attempted: records.len(),
            succeeded: records
                .iter()
                .filter(|r| r.outcome == RollbackOutcome::Success)
                .count(),
            failed: records
                .iter()
                .filter(|r| r.outcome == RollbackOutcome::Failed)
                .count(),
        };

        run.status = RunStatus::RolledBack;
        run.rollback = Some(RollbackInfo {
            reason: reason.to_string(),
            records,
            rolled_back_at: epoch_secs(),
        });
        self.store.save(&run)?;

        info!(
            %run_id,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "rollback finished"
        );
        Ok(summary)
    }
}
