//! Orchestrator — the stage/gate control loop.
//!
//! For each stage in order: resolve targets, execute installs, evaluate
//! the gate, persist the snapshot. The loop stops on a failed gate
//! (`Paused`) or a declined approval (`PendingApproval`); both are
//! resumable at the same stage index. Selection excludes every target
//! already attempted in the run, so re-running a stage after a resume
//! never attempts a target twice.

use std::sync::Arc;

use tracing::info;

use fleetwave_state::{epoch_secs, ArtifactSpec, DeploymentRun, RunStatus, RunStore};

use crate::approval::ApprovalProvider;
use crate::error::{EngineError, EngineResult};
use crate::executor::{self, NoopObserver, RolloutObserver};
use crate::gate::{self, GateDecision};
use crate::plan::{validate_stages, StageSpec};
use crate::pool::TargetPool;
use crate::remote::RemoteExecutor;
use crate::selector;

/// Drives one rollout plan against a fleet.
pub struct Orchestrator {
    stages: Vec<StageSpec>,
    store: RunStore,
    remote: Arc<dyn RemoteExecutor>,
    pool: Arc<dyn TargetPool>,
    approval: Option<Arc<dyn ApprovalProvider>>,
    observer: Arc<dyn RolloutObserver>,
}

impl Orchestrator {
    /// Create an orchestrator for a validated stage plan.
    pub fn new(
        stages: Vec<StageSpec>,
        store: RunStore,
        remote: Arc<dyn RemoteExecutor>,
        pool: Arc<dyn TargetPool>,
    ) -> EngineResult<Self> {
        validate_stages(&stages)?;
        Ok(Self {
            stages,
            store,
            remote,
            pool,
            approval: None,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Enable staged approval: the provider is consulted between stages.
    pub fn with_approval(mut self, approval: Arc<dyn ApprovalProvider>) -> Self {
        self.approval = Some(approval);
        self
    }

    /// Attach a progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn RolloutObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Start a new rollout run for the given artifact.
    pub fn start(&self, artifact: ArtifactSpec) -> EngineResult<DeploymentRun> {
        let id = format!(
            "run-{}-{}-{:04x}",
            sanitize(&artifact.package),
            epoch_secs(),
            rand::random::<u16>()
        );
        let mut run = DeploymentRun::new(id, artifact);
        self.store.save(&run)?;
        info!(run_id = %run.id, package = %run.artifact.package, "rollout started");

        self.drive(&mut run)?;
        Ok(run)
    }

    /// Resume a persisted run at its current stage index.
    ///
    /// Accepts `Paused` and `PendingApproval` (explicit resume) as well
    /// as `NotStarted`/`InProgress` snapshots left behind by an
    /// interrupted process. Terminal runs are rejected.
    pub fn resume(&self, run_id: &str) -> EngineResult<DeploymentRun> {
        let mut run = self.store.load(run_id)?;
        if run.status.is_terminal() {
            return Err(EngineError::NotResumable {
                id: run.id,
                status: run.status,
            });
        }
        info!(
            run_id = %run.id,
            stage_index = run.current_stage,
            from_status = ?run.status,
            "rollout resumed"
        );

        self.drive(&mut run)?;
        Ok(run)
    }

    /// Run the stage loop from `run.current_stage` until completion or a
    /// gate stop, persisting at every stage boundary.
    fn drive(&self, run: &mut DeploymentRun) -> EngineResult<()> {
        run.status = RunStatus::InProgress;

        while run.current_stage < self.stages.len() {
            let stage = &self.stages[run.current_stage];
            let exclusions = run.attempted_targets();
            let targets = selector::select_targets(
                stage,
                &exclusions,
                self.pool.as_ref(),
                &mut rand::thread_rng(),
            )?;

            run.ensure_stage(&stage.name);
            let results = executor::execute_stage(
                &stage.name,
                &targets,
                &run.artifact,
                self.remote.as_ref(),
                self.observer.as_ref(),
            );
            for result in results {
                run.record_result(result);
            }

            // The gate sees the stage's full result set, including results
            // recorded before a pause.
            let rate = gate::success_rate(run.stage_results(&stage.name));
            self.observer.stage_completed(&stage.name, rate);

            let is_final = run.current_stage + 1 == self.stages.len();
            match gate::evaluate(stage, rate, is_final, self.approval.as_deref()) {
                GateDecision::Pause => {
                    run.status = RunStatus::Paused;
                    self.store.save(run)?;
                    return Ok(());
                }
                GateDecision::AwaitApproval => {
                    run.status = RunStatus::PendingApproval;
                    self.store.save(run)?;
                    return Ok(());
                }
                GateDecision::Advance => {
                    run.current_stage += 1;
                    if run.current_stage == self.stages.len() {
                        run.status = RunStatus::Completed;
                        run.completed_at = Some(epoch_secs());
                        info!(run_id = %run.id, "rollout completed");
                    }
                    self.store.save(run)?;
                }
            }
        }
        Ok(())
    }
}

/// Restrict a package name to the store's filename-safe id alphabet.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
