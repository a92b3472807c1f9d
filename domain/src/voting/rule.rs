//! Margin rule for K-ahead voting
//!
//! This module defines the rule used to determine whether a leading
//! candidate has pulled far enough ahead to be declared the winner.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Margin used when neither the caller nor the session specifies one.
pub const DEFAULT_MARGIN_K: u32 = 3;

/// How a lone candidate (no runner-up at all) is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleCandidatePolicy {
    /// The absent runner-up counts as zero votes, so the margin requirement
    /// becomes an absolute count: the candidate wins once it has `k` votes.
    AbsoluteCount,
}

/// Policy applied by [`MarginRule`] when only one distinct candidate exists.
pub const SINGLE_CANDIDATE_POLICY: SingleCandidatePolicy = SingleCandidatePolicy::AbsoluteCount;

/// First-to-ahead-by-K rule
///
/// A leader wins once its vote count exceeds the runner-up's by at least `k`.
///
/// # Example
///
/// ```
/// use maker_domain::voting::MarginRule;
///
/// let rule = MarginRule::new(3).unwrap();
/// assert!(rule.is_satisfied(4, Some(1)));  // 4 - 1 = 3
/// assert!(!rule.is_satisfied(2, Some(0))); // 2 - 0 = 2
/// assert!(rule.is_satisfied(3, None));     // lone candidate with 3 votes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MarginRule {
    k: u32,
}

impl MarginRule {
    /// Create a rule with margin `k` (must be at least 1)
    pub fn new(k: u32) -> Result<Self, DomainError> {
        if k == 0 {
            return Err(DomainError::InvalidMargin(k));
        }
        Ok(Self { k })
    }

    /// The required margin
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Margin between the leader and the runner-up.
    ///
    /// With no runner-up the margin is the leader's own count, per
    /// [`SINGLE_CANDIDATE_POLICY`].
    pub fn margin(&self, leader: usize, runner_up: Option<usize>) -> usize {
        match (runner_up, SINGLE_CANDIDATE_POLICY) {
            (Some(second), _) => leader.saturating_sub(second),
            (None, SingleCandidatePolicy::AbsoluteCount) => leader,
        }
    }

    /// Check whether the leader has won
    pub fn is_satisfied(&self, leader: usize, runner_up: Option<usize>) -> bool {
        self.margin(leader, runner_up) >= self.k as usize
    }

    /// Get a human-readable description of this rule
    pub fn description(&self) -> String {
        format!("first to lead by {}", self.k)
    }
}

impl Default for MarginRule {
    fn default() -> Self {
        Self {
            k: DEFAULT_MARGIN_K,
        }
    }
}

impl TryFrom<u32> for MarginRule {
    type Error = DomainError;

    fn try_from(k: u32) -> Result<Self, Self::Error> {
        Self::new(k)
    }
}

impl From<MarginRule> for u32 {
    fn from(rule: MarginRule) -> Self {
        rule.k
    }
}

impl std::fmt::Display for MarginRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for MarginRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("k=");
        let k: u32 = digits
            .parse()
            .map_err(|_| format!("Invalid margin: {}. Expected a positive integer", s))?;
        Self::new(k).map_err(|e| e.to_string())
    }
}
