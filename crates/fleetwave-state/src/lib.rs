//! Fleetwave state — the durable record of a rollout.
//!
//! This crate defines the persisted data model (runs, per-target results,
//! rollback records) and the snapshot store that writes one JSON file per
//! run. Snapshots are human-inspectable and are read by reporting tooling
//! as a read-only consumer.
//!
//! # Components
//!
//! - **`types`** — `DeploymentRun`, `TargetResult`, `RollbackRecord` and friends
//! - **`store`** — `RunStore`, atomic write-temp-then-rename persistence
//! - **`error`** — `StateError` / `StateResult`

pub mod error;
pub mod store;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::RunStore;
pub use types::*;
