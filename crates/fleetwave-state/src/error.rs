//! Error types for the fleetwave run store.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during run store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open store: {0}")]
    Open(String),

    #[error("invalid run id: {0}")]
    InvalidId(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("run not found: {0}")]
    NotFound(String),
}
