//! Fleetwave engine — staged rollout orchestration with rollback.
//!
//! This crate drives a software artifact through ordered stages (e.g.
//! Pilot → Phase1 → Production), gating each stage on its observed
//! success rate and, optionally, a human approval. A companion rollback
//! path reverses every successful install of a persisted run.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator (per stage)
//!   ├── selector  — explicit list or percentage sample of the pool
//!   ├── executor  — probe/install per target, results captured
//!   ├── gate      — success rate vs threshold, optional approval
//!   └── RunStore  — snapshot persisted at every stage boundary
//! RollbackExecutor — loads a run, uninstalls its successful targets
//! ```
//!
//! Remote transport, inventory, and approval are injected behind the
//! `RemoteExecutor`, `TargetPool`, and `ApprovalProvider` traits.

pub mod approval;
pub mod error;
pub mod executor;
pub mod gate;
pub mod orchestrator;
pub mod plan;
pub mod pool;
pub mod remote;
pub mod rollback;
pub mod selector;

pub use approval::{ApprovalDecision, ApprovalProvider};
pub use error::{EngineError, EngineResult};
pub use executor::{execute_stage, NoopObserver, RolloutObserver};
pub use gate::{success_rate, GateDecision};
pub use orchestrator::Orchestrator;
pub use plan::{validate_stages, SelectorSpec, StageSpec};
pub use pool::{StaticPool, TargetPool};
pub use remote::{ExecOutcome, RemoteExecutor};
pub use rollback::{RollbackExecutor, RollbackSummary};
pub use selector::select_targets;
