//! RunStore — JSON snapshot persistence for rollout runs.
//!
//! One pretty-printed JSON file per run, keyed by run id, under a root
//! directory. Writes go to a `.tmp` sibling first and are renamed into
//! place, so a crash mid-write never leaves a corrupt snapshot. The
//! files are the read-only input for reporting/dashboard tooling.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::types::DeploymentRun;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Directory-backed store of run snapshots.
#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    /// Open (or create) a run store rooted at the given directory.
    pub fn open(root: &Path) -> StateResult<Self> {
        fs::create_dir_all(root).map_err(map_err!(Open))?;
        debug!(?root, "run store opened");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Persist the complete run snapshot, overwriting any prior one.
    ///
    /// Idempotent; atomic via write-temp-then-rename.
    pub fn save(&self, run: &DeploymentRun) -> StateResult<()> {
        let path = self.run_path(&run.id)?;
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(run).map_err(map_err!(Serialize))?;
        fs::write(&tmp, &bytes).map_err(map_err!(Write))?;
        fs::rename(&tmp, &path).map_err(map_err!(Write))?;

        debug!(run_id = %run.id, ?path, "run snapshot saved");
        Ok(())
    }

    /// Load a run snapshot by id.
    pub fn load(&self, id: &str) -> StateResult<DeploymentRun> {
        let path = self.run_path(id)?;
        if !path.exists() {
            return Err(StateError::NotFound(id.to_string()));
        }
        let bytes = fs::read(&path).map_err(map_err!(Read))?;
        serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))
    }

    /// List all persisted runs, newest first.
    pub fn list(&self) -> StateResult<Vec<DeploymentRun>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(map_err!(Read))? {
            let entry = entry.map_err(map_err!(Read))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).map_err(map_err!(Read))?;
            let run: DeploymentRun =
                serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
            runs.push(run);
        }
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    /// Resolve the snapshot path for a run id.
    ///
    /// Ids are restricted to a filename-safe alphabet so a caller-supplied
    /// id can never escape the store root.
    fn run_path(&self, id: &str) -> StateResult<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.contains("..");
        if !safe {
            return Err(StateError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}
