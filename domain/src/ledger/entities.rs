//! Execution ledger entities
//!
//! An [`ExecutionState`] is the durable record of one session: one
//! [`StepRecord`] per decision point, aggregate [`Metrics`], and the session
//! status.

use crate::core::error::DomainError;
use crate::core::session_id::SessionId;
use crate::voting::rule::DEFAULT_MARGIN_K;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Status of one decision point
///
/// `Voting` moves to `Decided` or `Failed`; both are terminal unless a later
/// update for the same step id overwrites the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Voting,
    Decided,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Voting => "voting",
            StepStatus::Decided => "decided",
            StepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Decided | StepStatus::Failed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "voting" => Ok(StepStatus::Voting),
            "decided" => Ok(StepStatus::Decided),
            "failed" => Ok(StepStatus::Failed),
            _ => Err(DomainError::InvalidStepStatus(s.to_string())),
        }
    }
}

/// Status of a whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Success,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Success => "success",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How aggregate metrics react to repeated updates of the same step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricsMode {
    /// Every update adds its counts to running totals, even when it
    /// overwrites an existing step record.
    #[default]
    Cumulative,
    /// Totals are recomputed from the current step records after each
    /// update, so retried updates are idempotent.
    Derived,
}

/// Outcome of one decision point as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_id: String,
    pub status: StepStatus,
    /// Votes cast before the decision
    pub votes: u64,
    /// Winning margin
    pub margin: u64,
    /// Proposals rejected outright rather than counted
    pub red_flags: u64,
    /// The decided action/result payload, if any
    pub winner: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl StepRecord {
    pub fn new(step_id: impl Into<String>, status: StepStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            step_id: step_id.into(),
            status,
            votes: 0,
            margin: 0,
            red_flags: 0,
            winner: None,
            updated_at,
        }
    }

    pub fn with_winner(mut self, winner: Value) -> Self {
        self.winner = Some(winner);
        self
    }

    pub fn with_counts(mut self, votes: u64, margin: u64, red_flags: u64) -> Self {
        self.votes = votes;
        self.margin = margin;
        self.red_flags = red_flags;
        self
    }
}

/// Aggregate counters for a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub total_votes_cast: u64,
    pub red_flags: u64,
    pub completed_steps: u64,
    pub failed_steps: u64,
}

/// Where an interrupted session should pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    pub completed_steps: u32,
    pub total_steps: u32,
    pub next_step: u32,
    pub can_resume: bool,
}

/// Durable progress record for one session
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use maker_domain::{ExecutionState, MetricsMode, SessionId, StepRecord, StepStatus};
///
/// let id = SessionId::parse("demo").unwrap();
/// let mut state = ExecutionState::new(id, 2, "two steps", 3, Utc::now()).unwrap();
///
/// state.apply_step(StepRecord::new("step-1", StepStatus::Decided, Utc::now()), MetricsMode::Cumulative);
/// assert_eq!(state.current_step, 1);
/// assert_eq!(state.resume_point().next_step, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub session_id: SessionId,
    #[serde(default)]
    pub task_description: String,
    #[serde(default)]
    pub total_steps: u32,
    /// Margin used for every step of this session
    #[serde(default = "default_k")]
    pub k: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SessionStatus,
    /// Number of decided steps
    #[serde(default)]
    pub current_step: u32,
    #[serde(default)]
    pub steps: BTreeMap<String, StepRecord>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_k() -> u32 {
    DEFAULT_MARGIN_K
}

impl ExecutionState {
    /// Fresh in-progress state with no steps recorded
    pub fn new(
        session_id: SessionId,
        total_steps: u32,
        task_description: impl Into<String>,
        k: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if total_steps == 0 {
            return Err(DomainError::InvalidTotalSteps(total_steps));
        }
        if k == 0 {
            return Err(DomainError::InvalidMargin(k));
        }
        Ok(Self {
            session_id,
            task_description: task_description.into(),
            total_steps,
            k,
            started_at,
            status: SessionStatus::InProgress,
            current_step: 0,
            steps: BTreeMap::new(),
            metrics: Metrics::default(),
            completed_at: None,
        })
    }

    /// Placeholder state for a session that was never initialized.
    ///
    /// Carries no task description and zero total steps, so it can never be
    /// resumed until re-initialized.
    pub fn shell(session_id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            task_description: String::new(),
            total_steps: 0,
            k: DEFAULT_MARGIN_K,
            started_at,
            status: SessionStatus::InProgress,
            current_step: 0,
            steps: BTreeMap::new(),
            metrics: Metrics::default(),
            completed_at: None,
        }
    }

    /// Number of steps whose record is `Decided`
    pub fn decided_count(&self) -> u32 {
        let decided = self
            .steps
            .values()
            .filter(|s| s.status == StepStatus::Decided)
            .count();
        u32::try_from(decided).unwrap_or(u32::MAX)
    }

    /// Write (or overwrite) a step record and update the derived counters.
    pub fn apply_step(&mut self, record: StepRecord, mode: MetricsMode) {
        let (status, votes, red_flags) = (record.status, record.votes, record.red_flags);
        self.steps.insert(record.step_id.clone(), record);
        self.current_step = self.decided_count();

        match mode {
            MetricsMode::Cumulative => {
                let metrics = &mut self.metrics;
                match status {
                    StepStatus::Decided => {
                        metrics.completed_steps = metrics.completed_steps.saturating_add(1)
                    }
                    StepStatus::Failed => {
                        metrics.failed_steps = metrics.failed_steps.saturating_add(1)
                    }
                    StepStatus::Voting => {}
                }
                // Counts come from callers unchecked; totals pin at the maximum
                metrics.total_votes_cast = metrics.total_votes_cast.saturating_add(votes);
                metrics.red_flags = metrics.red_flags.saturating_add(red_flags);
            }
            MetricsMode::Derived => self.metrics = self.derived_metrics(),
        }
    }

    /// Metrics recomputed from the current step records only
    pub fn derived_metrics(&self) -> Metrics {
        self.steps.values().fold(Metrics::default(), |mut acc, step| {
            match step.status {
                StepStatus::Decided => {
                    acc.completed_steps = acc.completed_steps.saturating_add(1)
                }
                StepStatus::Failed => acc.failed_steps = acc.failed_steps.saturating_add(1),
                StepStatus::Voting => {}
            }
            acc.total_votes_cast = acc.total_votes_cast.saturating_add(step.votes);
            acc.red_flags = acc.red_flags.saturating_add(step.red_flags);
            acc
        })
    }

    pub fn resume_point(&self) -> ResumePoint {
        let completed = self.decided_count();
        ResumePoint {
            completed_steps: completed,
            total_steps: self.total_steps,
            next_step: completed.saturating_add(1),
            can_resume: completed < self.total_steps && self.status == SessionStatus::InProgress,
        }
    }

    /// Finalize the session
    pub fn complete(&mut self, success: bool, completed_at: DateTime<Utc>) {
        self.status = if success {
            SessionStatus::Success
        } else {
            SessionStatus::Failed
        };
        self.completed_at = Some(completed_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(total: u32) -> ExecutionState {
        ExecutionState::new(SessionId::parse("s").unwrap(), total, "task", 3, Utc::now()).unwrap()
    }

    fn step(id: &str, status: StepStatus, votes: u64, red_flags: u64) -> StepRecord {
        StepRecord::new(id, status, Utc::now()).with_counts(votes, 3, red_flags)
    }

    #[test]
    fn test_new_validates_arguments() {
        let id = SessionId::parse("s").unwrap();
        assert_eq!(
            ExecutionState::new(id.clone(), 0, "t", 3, Utc::now()),
            Err(DomainError::InvalidTotalSteps(0))
        );
        assert_eq!(
            ExecutionState::new(id, 2, "t", 0, Utc::now()),
            Err(DomainError::InvalidMargin(0))
        );
    }

    #[test]
    fn test_step_status_parse() {
        assert_eq!("decided".parse::<StepStatus>(), Ok(StepStatus::Decided));
        assert_eq!("VOTING".parse::<StepStatus>(), Ok(StepStatus::Voting));
        assert!("done".parse::<StepStatus>().is_err());
        assert!(StepStatus::Failed.is_terminal());
        assert!(!StepStatus::Voting.is_terminal());
    }

    #[test]
    fn test_current_step_counts_decided_only() {
        let mut s = state(5);
        s.apply_step(step("1", StepStatus::Decided, 3, 0), MetricsMode::Cumulative);
        s.apply_step(step("2", StepStatus::Failed, 6, 1), MetricsMode::Cumulative);
        s.apply_step(step("3", StepStatus::Voting, 2, 0), MetricsMode::Cumulative);

        assert_eq!(s.current_step, 1);
        assert_eq!(s.metrics.completed_steps, 1);
        assert_eq!(s.metrics.failed_steps, 1);
        assert_eq!(s.metrics.total_votes_cast, 11);
        assert_eq!(s.metrics.red_flags, 1);
    }

    #[test]
    fn test_cumulative_metrics_count_repeated_updates() {
        let mut s = state(5);
        s.apply_step(step("1", StepStatus::Decided, 3, 1), MetricsMode::Cumulative);
        s.apply_step(step("1", StepStatus::Decided, 4, 2), MetricsMode::Cumulative);

        assert_eq!(s.steps.len(), 1);
        assert_eq!(s.steps["1"].votes, 4);
        assert_eq!(s.current_step, 1);
        assert_eq!(s.metrics.completed_steps, 2);
        assert_eq!(s.metrics.total_votes_cast, 7);
        assert_eq!(s.metrics.red_flags, 3);
    }

    #[test]
    fn test_derived_metrics_are_idempotent() {
        let mut s = state(5);
        s.apply_step(step("1", StepStatus::Decided, 3, 1), MetricsMode::Derived);
        s.apply_step(step("1", StepStatus::Decided, 4, 2), MetricsMode::Derived);

        assert_eq!(
            s.metrics,
            Metrics {
                total_votes_cast: 4,
                red_flags: 2,
                completed_steps: 1,
                failed_steps: 0,
            }
        );
    }

    #[test]
    fn test_huge_counts_saturate() {
        let mut s = state(5);
        s.apply_step(step("1", StepStatus::Voting, u64::MAX, u64::MAX), MetricsMode::Cumulative);
        s.apply_step(step("1", StepStatus::Decided, u64::MAX, 1), MetricsMode::Cumulative);
        assert_eq!(s.metrics.total_votes_cast, u64::MAX);
        assert_eq!(s.metrics.red_flags, u64::MAX);

        let mut s = state(5);
        s.apply_step(step("1", StepStatus::Decided, u64::MAX, 0), MetricsMode::Derived);
        s.apply_step(step("2", StepStatus::Decided, u64::MAX, 0), MetricsMode::Derived);
        assert_eq!(s.metrics.total_votes_cast, u64::MAX);
        assert_eq!(s.metrics.completed_steps, 2);
    }

    #[test]
    fn test_overwrite_changes_current_step() {
        let mut s = state(5);
        s.apply_step(step("1", StepStatus::Decided, 3, 0), MetricsMode::Cumulative);
        s.apply_step(step("1", StepStatus::Failed, 3, 0), MetricsMode::Cumulative);
        assert_eq!(s.current_step, 0);
    }

    #[test]
    fn test_resume_point() {
        let mut s = state(5);
        for id in ["1", "2", "3"] {
            s.apply_step(step(id, StepStatus::Decided, 3, 0), MetricsMode::Cumulative);
        }

        assert_eq!(
            s.resume_point(),
            ResumePoint {
                completed_steps: 3,
                total_steps: 5,
                next_step: 4,
                can_resume: true,
            }
        );

        s.complete(true, Utc::now());
        assert_eq!(s.status, SessionStatus::Success);
        assert!(s.completed_at.is_some());
        assert!(!s.resume_point().can_resume);
        assert_eq!(s.resume_point().completed_steps, 3);
    }

    #[test]
    fn test_resume_point_when_all_decided() {
        let mut s = state(2);
        s.apply_step(step("1", StepStatus::Decided, 3, 0), MetricsMode::Cumulative);
        s.apply_step(step("2", StepStatus::Decided, 3, 0), MetricsMode::Cumulative);
        assert!(!s.resume_point().can_resume);
        assert_eq!(s.resume_point().next_step, 3);
    }

    #[test]
    fn test_shell_cannot_resume() {
        let s = ExecutionState::shell(SessionId::parse("s").unwrap(), Utc::now());
        assert!(!s.resume_point().can_resume);
        assert_eq!(s.k, DEFAULT_MARGIN_K);
    }

    #[test]
    fn test_document_shape() {
        let mut s = state(3);
        s.apply_step(
            step("1", StepStatus::Decided, 3, 0).with_winner(json!({"action": "x", "result": "y"})),
            MetricsMode::Cumulative,
        );
        let doc = serde_json::to_value(&s).unwrap();

        assert_eq!(doc["session_id"], "s");
        assert_eq!(doc["status"], "in_progress");
        assert_eq!(doc["current_step"], 1);
        assert_eq!(doc["steps"]["1"]["status"], "decided");
        assert_eq!(doc["steps"]["1"]["winner"]["action"], "x");
        assert_eq!(doc["metrics"]["completed_steps"], 1);
        assert!(doc.get("completed_at").is_none());

        let back: ExecutionState = serde_json::from_value(doc).unwrap();
        assert_eq!(back, s);
    }
}
