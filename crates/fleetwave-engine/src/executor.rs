//! Stage execution — drive install attempts and capture outcomes.
//!
//! Targets are processed strictly sequentially. Per-target failures are
//! data, never errors: a collaborator failure (explicit or `Err`) is
//! recorded as `Failed` and the loop moves on, so one broken machine
//! cannot abort a stage.

use tracing::{debug, info, warn};

use fleetwave_state::{epoch_secs, ArtifactSpec, Outcome, TargetId, TargetResult};

use crate::remote::{ExecOutcome, RemoteExecutor};

/// Progress callbacks with no bearing on control flow.
pub trait RolloutObserver: Send + Sync {
    fn target_completed(&self, _result: &TargetResult) {}
    fn stage_completed(&self, _stage: &str, _success_rate: f64) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl RolloutObserver for NoopObserver {}

/// Execute one stage: probe then install each target, in order.
///
/// Targets already carrying the artifact are recorded as `Skipped`
/// (a non-failure for the gate). Returns one result per target.
pub fn execute_stage(
    stage: &str,
    targets: &[TargetId],
    artifact: &ArtifactSpec,
    remote: &dyn RemoteExecutor,
    observer: &dyn RolloutObserver,
) -> Vec<TargetResult> {
    let mut results = Vec::with_capacity(targets.len());

    for target in targets {
        let (outcome, error) = match remote.is_installed(target, artifact) {
            Ok(true) => {
                debug!(%target, %stage, "artifact already installed, skipping");
                (Outcome::Skipped, None)
            }
            Ok(false) => match remote.install(target, artifact) {
                Ok(ExecOutcome::Success) => {
                    debug!(%target, %stage, "install succeeded");
                    (Outcome::Success, None)
                }
                Ok(ExecOutcome::Failure(reason)) => {
                    warn!(%target, %stage, %reason, "install failed");
                    (Outcome::Failed, Some(reason))
                }
                Err(e) => {
                    warn!(%target, %stage, error = %e, "install call failed");
                    (Outcome::Failed, Some(e.to_string()))
                }
            },
            Err(e) => {
                warn!(%target, %stage, error = %e, "install probe failed");
                (Outcome::Failed, Some(format!("probe failed: {e}")))
            }
        };

        let result = TargetResult {
            target: target.clone(),
            stage: stage.to_string(),
            outcome,
            error,
            recorded_at: epoch_secs(),
        };
        observer.target_completed(&result);
        results.push(result);
    }

    info!(
        %stage,
        attempted = results.len(),
        failed = results.iter().filter(|r| r.outcome == Outcome::Failed).count(),
        "stage execution finished"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted remote: `installed` targets probe true, `broken` targets
    /// fail installs, everything else succeeds. Records install calls.
    struct ScriptedRemote {
        installed: Vec<String>,
        broken: Vec<String>,
        install_calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        fn new(installed: &[&str], broken: &[&str]) -> Self {
            Self {
                installed: installed.iter().map(|s| s.to_string()).collect(),
                broken: broken.iter().map(|s| s.to_string()).collect(),
                install_calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl RemoteExecutor for ScriptedRemote {
        fn install(&self, target: &str, _artifact: &ArtifactSpec) -> anyhow::Result<ExecOutcome> {
            self.install_calls.lock().unwrap().push(target.to_string());
            if self.broken.iter().any(|b| b == target) {
                Ok(ExecOutcome::Failure("msiexec exited 1603".to_string()))
            } else {
                Ok(ExecOutcome::Success)
            }
        }

        fn uninstall(&self, _target: &str, _artifact: &ArtifactSpec) -> anyhow::Result<ExecOutcome> {
            Ok(ExecOutcome::Success)
        }

        fn is_installed(&self, target: &str, _artifact: &ArtifactSpec) -> anyhow::Result<bool> {
            Ok(self.installed.iter().any(|i| i == target))
        }
    }

    fn artifact() -> ArtifactSpec {
        ArtifactSpec {
            package: "corp-agent".to_string(),
            version: "2.1.0".to_string(),
        }
    }

    fn names(targets: &[&str]) -> Vec<TargetId> {
        targets.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn outcomes_are_recorded_per_target() {
        let remote = ScriptedRemote::new(&["m2"], &["m3"]);
        let results = execute_stage(
            "pilot",
            &names(&["m1", "m2", "m3"]),
            &artifact(),
            &remote,
            &NoopObserver,
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, Outcome::Success);
        assert_eq!(results[1].outcome, Outcome::Skipped);
        assert_eq!(results[2].outcome, Outcome::Failed);
        assert_eq!(results[2].error.as_deref(), Some("msiexec exited 1603"));
    }

    #[test]
    fn already_installed_targets_are_not_reinstalled() {
        let remote = ScriptedRemote::new(&["m1", "m2"], &[]);
        execute_stage("pilot", &names(&["m1", "m2"]), &artifact(), &remote, &NoopObserver);
        assert!(remote.install_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failure_does_not_halt_remaining_targets() {
        let remote = ScriptedRemote::new(&[], &["m1"]);
        let results =
            execute_stage("pilot", &names(&["m1", "m2"]), &artifact(), &remote, &NoopObserver);
        assert_eq!(results[0].outcome, Outcome::Failed);
        assert_eq!(results[1].outcome, Outcome::Success);
    }

    #[test]
    fn collaborator_errors_are_captured_not_propagated() {
        struct ErringRemote;
        impl RemoteExecutor for ErringRemote {
            fn install(&self, _t: &str, _a: &ArtifactSpec) -> anyhow::Result<ExecOutcome> {
                anyhow::bail!("connection reset")
            }
            fn uninstall(&self, _t: &str, _a: &ArtifactSpec) -> anyhow::Result<ExecOutcome> {
                Ok(ExecOutcome::Success)
            }
            fn is_installed(&self, target: &str, _a: &ArtifactSpec) -> anyhow::Result<bool> {
                if target == "m2" {
                    anyhow::bail!("winrm unreachable")
                }
                Ok(false)
            }
        }

        let results =
            execute_stage("pilot", &names(&["m1", "m2"]), &artifact(), &ErringRemote, &NoopObserver);
        assert_eq!(results[0].outcome, Outcome::Failed);
        assert_eq!(results[0].error.as_deref(), Some("connection reset"));
        assert_eq!(results[1].outcome, Outcome::Failed);
        assert!(results[1].error.as_deref().unwrap().starts_with("probe failed"));
    }

    #[test]
    fn observer_sees_every_target() {
        struct Counting(Mutex<usize>);
        impl RolloutObserver for Counting {
            fn target_completed(&self, _result: &TargetResult) {
                *self.0.lock().unwrap() += 1;
            }
        }

        let remote = ScriptedRemote::new(&[], &[]);
        let observer = Counting(Mutex::new(0));
        execute_stage(
            "pilot",
            &names(&["m1", "m2", "m3"]),
            &artifact(),
            &remote,
            &observer,
        );
        assert_eq!(*observer.0.lock().unwrap(), 3);
    }

    #[test]
    fn empty_target_list_yields_no_results() {
        let remote = ScriptedRemote::new(&[], &[]);
        let results = execute_stage("pilot", &[], &artifact(), &remote, &NoopObserver);
        assert!(results.is_empty());
    }
}
