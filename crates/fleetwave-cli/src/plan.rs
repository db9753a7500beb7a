//! Rollout plan files.
//!
//! A plan is a TOML file describing the artifact, the command templates
//! used to reach targets, the candidate pool, and the ordered stages.
//!
//! ```toml
//! [artifact]
//! package = "corp-agent"
//! version = "2.1.0"
//!
//! [settings]
//! data_dir = ".fleetwave"
//! staged_approval = true
//!
//! [executor]
//! install = "ssh {target} 'pkg install {package}-{version}'"
//! uninstall = "ssh {target} 'pkg remove {package}'"
//! probe = "ssh {target} 'pkg query {package}-{version}'"
//!
//! [pool]
//! targets = ["machine-001", "machine-002"]
//!
//! [[stage]]
//! name = "pilot"
//! targets = ["machine-001"]
//! threshold = 0.9
//!
//! [[stage]]
//! name = "phase1"
//! percent = 20
//! threshold = 0.95
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

use fleetwave_engine::{SelectorSpec, StageSpec};
use fleetwave_state::ArtifactSpec;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    pub artifact: ArtifactSection,
    #[serde(default)]
    pub settings: SettingsSection,
    pub executor: ExecutorSection,
    #[serde(default)]
    pub pool: PoolSection,
    #[serde(rename = "stage")]
    pub stages: Vec<StageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSection {
    pub package: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SettingsSection {
    /// Directory for run snapshots.
    pub data_dir: PathBuf,
    /// Ask for approval between stages.
    pub staged_approval: bool,
    /// Answer approval prompts with yes (non-interactive use).
    pub assume_yes: bool,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".fleetwave"),
            staged_approval: false,
            assume_yes: false,
        }
    }
}

/// Command templates; `{target}`, `{package}` and `{version}` are
/// substituted per call.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSection {
    pub install: String,
    pub uninstall: String,
    pub probe: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PoolSection {
    /// Candidate pool for percentage stages.
    #[serde(default)]
    pub targets: Vec<String>,
}

/// One `[[stage]]` entry: exactly one of `targets` / `percent`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageEntry {
    pub name: String,
    pub threshold: f64,
    pub targets: Option<Vec<String>>,
    pub percent: Option<u32>,
}

impl PlanFile {
    /// Load and parse a plan file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read plan file {}", path.display()))?;
        let plan: PlanFile = toml::from_str(&raw)
            .with_context(|| format!("invalid plan file {}", path.display()))?;
        Ok(plan)
    }

    pub fn artifact_spec(&self) -> ArtifactSpec {
        ArtifactSpec {
            package: self.artifact.package.clone(),
            version: self.artifact.version.clone(),
        }
    }

    /// Convert `[[stage]]` entries into engine stage specs, ordinals
    /// assigned from file order.
    pub fn stage_specs(&self) -> anyhow::Result<Vec<StageSpec>> {
        let mut specs = Vec::with_capacity(self.stages.len());
        for (i, entry) in self.stages.iter().enumerate() {
            let selector = match (&entry.targets, entry.percent) {
                (Some(targets), None) => SelectorSpec::Explicit {
                    targets: targets.clone(),
                },
                (None, Some(percent)) => SelectorSpec::Percentage { percent },
                _ => bail!(
                    "stage {} must set exactly one of `targets` or `percent`",
                    entry.name
                ),
            };
            specs.push(StageSpec {
                name: entry.name.clone(),
                ordinal: i as u32,
                selector,
                threshold: entry.threshold,
            });
        }
        Ok(specs)
    }
}
