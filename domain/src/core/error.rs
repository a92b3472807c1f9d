//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised when an argument falls outside the domain a rule or formula is
/// defined for. These are never clamped or silently corrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("k must be >= 1, got {0}")]
    InvalidMargin(u32),

    #[error("total_steps must be >= 1, got {0}")]
    InvalidTotalSteps(u32),

    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Invalid step status: {0} (valid: voting, decided, failed)")]
    InvalidStepStatus(String),

    #[error("Invalid task type: {0} (valid: fast, standard, high_stakes)")]
    InvalidTaskType(String),

    #[error("{name} must be in (0, 1), got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be >= 1, got {value}")]
    CountBelowOne { name: &'static str, value: u64 },

    #[error("cost_per_call must be a non-negative number, got {0}")]
    InvalidCost(f64),

    #[error("target {target} is unreachable with per-step accuracy p={p}")]
    TargetUnreachable { p: f64, target: f64 },
}
