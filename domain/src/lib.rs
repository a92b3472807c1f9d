//! Domain layer for maker
//!
//! This crate contains the core decision logic, ledger entities, and
//! reliability formulas. It has no dependencies on storage or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## K-ahead voting
//!
//! Many noisy proposals for the same step are tallied until one candidate
//! leads the runner-up by `k` votes. See [`voting`].
//!
//! ## Execution ledger
//!
//! A session's progress is one [`StepRecord`] per decided (or failed) step
//! plus aggregate [`Metrics`], enough to resume an interrupted run. See
//! [`ledger`].
//!
//! ## Reliability
//!
//! Closed-form estimates for choosing `k`. See [`reliability`].

pub mod core;
pub mod ledger;
pub mod reliability;
pub mod voting;

// Re-export commonly used types
pub use core::{error::DomainError, session_id::SessionId};
pub use ledger::{
    ExecutionState, Metrics, MetricsMode, ResumePoint, SessionStatus, StepRecord, StepStatus,
};
pub use reliability::{CostEstimate, KRecommendation, TaskType};
pub use voting::{
    Ballot, CanonicalKey, DEFAULT_MARGIN_K, Decision, MarginRule, SINGLE_CANDIDATE_POLICY,
    SingleCandidatePolicy, Standing, Tally, Verdict, normalize,
};
