//! Execution ledger domain.
//!
//! - [`entities::ExecutionState`]: durable progress of one session
//! - [`entities::StepRecord`]: outcome of one decision point
//! - [`entities::ResumePoint`]: where an interrupted session continues
//!
//! Persistence is not handled here; the application layer defines the
//! storage ports and infrastructure provides the file-backed adapters.

pub mod entities;

pub use entities::{
    ExecutionState, Metrics, MetricsMode, ResumePoint, SessionStatus, StepRecord, StepStatus,
};
