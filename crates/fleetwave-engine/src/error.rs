//! Error types for the fleetwave engine.

use thiserror::Error;

use fleetwave_state::{RunStatus, StateError};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while orchestrating or rolling back a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("invalid stage plan: {0}")]
    InvalidPlan(String),

    #[error("run {id} is not resumable from status {status:?}")]
    NotResumable { id: String, status: RunStatus },

    #[error("run {0} has already been rolled back")]
    AlreadyRolledBack(String),

    #[error("candidate pool query failed: {0}")]
    Pool(String),
}
