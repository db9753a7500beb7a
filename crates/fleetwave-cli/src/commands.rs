//! Command implementations for the `fleetwave` binary.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use fleetwave_engine::{Orchestrator, RollbackExecutor, StaticPool};
use fleetwave_state::{DeploymentRun, Outcome, RunStore};

use crate::approve::ConsoleApproval;
use crate::exec::CommandExecutor;
use crate::plan::PlanFile;

/// Start a new rollout run from a plan file.
pub fn deploy(plan_path: &Path) -> anyhow::Result<()> {
    let plan = PlanFile::load(plan_path)?;
    let orchestrator = build_orchestrator(&plan)?;

    let run = orchestrator.start(plan.artifact_spec())?;
    print_run(&run);
    Ok(())
}

/// Resume a paused or pending-approval run at its current stage.
pub fn resume(run_id: &str, plan_path: &Path) -> anyhow::Result<()> {
    let plan = PlanFile::load(plan_path)?;
    let orchestrator = build_orchestrator(&plan)?;

    let run = orchestrator.resume(run_id)?;
    print_run(&run);
    Ok(())
}

/// Reverse every successful install of a run.
pub fn rollback(run_id: &str, reason: &str, plan_path: &Path) -> anyhow::Result<()> {
    let plan = PlanFile::load(plan_path)?;
    let store = RunStore::open(&plan.settings.data_dir)?;
    let remote = Arc::new(CommandExecutor::new(&plan.executor));

    let summary = RollbackExecutor::new(store, remote).rollback(run_id, reason)?;
    println!(
        "✓ Rolled back {} ({} uninstalled, {} failed)",
        summary.run_id, summary.succeeded, summary.failed
    );
    Ok(())
}

/// Show one run as JSON, or list all runs.
pub fn status(run_id: Option<&str>, plan_path: &Path) -> anyhow::Result<()> {
    let plan = PlanFile::load(plan_path)?;
    let store = RunStore::open(&plan.settings.data_dir)?;

    match run_id {
        Some(id) => {
            let run = store.load(id)?;
            let json = serde_json::to_string_pretty(&run).context("serializing run")?;
            println!("{json}");
        }
        None => {
            for run in store.list()? {
                println!(
                    "{}  {:?}  stage {}  {} {}",
                    run.id, run.status, run.current_stage, run.artifact.package, run.artifact.version
                );
            }
        }
    }
    Ok(())
}

fn build_orchestrator(plan: &PlanFile) -> anyhow::Result<Orchestrator> {
    let store = RunStore::open(&plan.settings.data_dir)?;
    let remote = Arc::new(CommandExecutor::new(&plan.executor));
    let pool = Arc::new(StaticPool::new(plan.pool.targets.clone()));

    let mut orchestrator = Orchestrator::new(plan.stage_specs()?, store, remote, pool)?;
    if plan.settings.staged_approval {
        orchestrator = orchestrator
            .with_approval(Arc::new(ConsoleApproval::new(plan.settings.assume_yes)));
    }
    Ok(orchestrator)
}

fn print_run(run: &DeploymentRun) {
    println!("Run {} — {:?}", run.id, run.status);
    for stage in &run.stages {
        let ok = stage
            .results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Success | Outcome::Skipped))
            .count();
        println!(
            "  {}: {}/{} succeeded",
            stage.stage,
            ok,
            stage.results.len()
        );
    }
}
