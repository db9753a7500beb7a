//! Command-template remote executor.
//!
//! Each install/uninstall/probe call renders its template and runs it
//! through `sh -c`. The probe's exit status is the answer (0 = already
//! installed); for install/uninstall a non-zero exit becomes an explicit
//! `ExecOutcome::Failure` carrying stderr.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use fleetwave_engine::{ExecOutcome, RemoteExecutor};
use fleetwave_state::ArtifactSpec;

use crate::plan::ExecutorSection;

pub struct CommandExecutor {
    install: String,
    uninstall: String,
    probe: String,
}

impl CommandExecutor {
    pub fn new(section: &ExecutorSection) -> Self {
        Self {
            install: section.install.clone(),
            uninstall: section.uninstall.clone(),
            probe: section.probe.clone(),
        }
    }

    fn run_template(&self, template: &str, target: &str, artifact: &ArtifactSpec) -> Result<ExecOutcome> {
        let cmd = render(template, target, artifact);
        debug!(%target, %cmd, "running fleet command");
        let output = Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .output()
            .with_context(|| format!("failed to spawn: {cmd}"))?;

        if output.status.success() {
            Ok(ExecOutcome::Success)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                s => s.to_string(),
            };
            Ok(ExecOutcome::Failure(reason))
        }
    }
}

impl RemoteExecutor for CommandExecutor {
    fn install(&self, target: &str, artifact: &ArtifactSpec) -> Result<ExecOutcome> {
        self.run_template(&self.install, target, artifact)
    }

    fn uninstall(&self, target: &str, artifact: &ArtifactSpec) -> Result<ExecOutcome> {
        self.run_template(&self.uninstall, target, artifact)
    }

    fn is_installed(&self, target: &str, artifact: &ArtifactSpec) -> Result<bool> {
        let cmd = render(&self.probe, target, artifact);
        debug!(%target, %cmd, "running probe command");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .status()
            .with_context(|| format!("failed to spawn: {cmd}"))?;
        Ok(status.success())
    }
}

/// Substitute `{target}`, `{package}` and `{version}` placeholders.
fn render(template: &str, target: &str, artifact: &ArtifactSpec) -> String {
    template
        .replace("{target}", target)
        .replace("{package}", &artifact.package)
        .replace("{version}", &artifact.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ArtifactSpec {
        ArtifactSpec {
            package: "corp-agent".to_string(),
            version: "2.1.0".to_string(),
        }
    }

    fn executor(install: &str, uninstall: &str, probe: &str) -> CommandExecutor {
        CommandExecutor::new(&ExecutorSection {
            install: install.to_string(),
            uninstall: uninstall.to_string(),
            probe: probe.to_string(),
        })
    }

    #[test]
    fn placeholders_are_substituted() {
        let cmd = render("deploy {target} {package}-{version}", "m1", &artifact());
        assert_eq!(cmd, "deploy m1 corp-agent-2.1.0");
    }

    #[test]
    fn zero_exit_is_success() {
        let exec = executor("true", "true", "true");
        assert_eq!(
            exec.install("m1", &artifact()).unwrap(),
            ExecOutcome::Success
        );
    }

    #[test]
    fn nonzero_exit_is_failure_with_stderr() {
        let exec = executor("echo 'no route to {target}' >&2; exit 3", "true", "true");
        match exec.install("m1", &artifact()).unwrap() {
            ExecOutcome::Failure(reason) => assert_eq!(reason, "no route to m1"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn probe_maps_exit_status_to_installed() {
        let exec = executor("true", "true", "true");
        assert!(exec.is_installed("m1", &artifact()).unwrap());

        let exec = executor("true", "true", "false");
        assert!(!exec.is_installed("m1", &artifact()).unwrap());
    }
}
