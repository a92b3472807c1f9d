//! Application layer for maker
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{LedgerPolicy, MissingSessionPolicy};
pub use ports::{
    audit_log::{InMemoryAuditLog, NoAuditLog, StepAuditLog},
    state_store::{ExecutionStateStore, InMemoryStateStore, SessionLock, StoreError},
    vote_log::{InMemoryVoteLog, VoteLog},
};
pub use use_cases::cast_vote::{CastVoteError, CastVoteUseCase};
pub use use_cases::decide_step::{DecideStepError, DecideStepInput, DecideStepUseCase};
pub use use_cases::execution_ledger::{
    ExecutionLedger, InitializeInput, LedgerError, UpdateStepInput,
};
