//! Execution ledger use case
//!
//! Records per-step outcomes of a session, answers where to resume, and
//! finalizes the session. Every mutation is a locked read-modify-write of the
//! whole state document.

use crate::config::{LedgerPolicy, MissingSessionPolicy};
use crate::ports::audit_log::StepAuditLog;
use crate::ports::state_store::{ExecutionStateStore, StoreError};
use chrono::Utc;
use maker_domain::{
    DEFAULT_MARGIN_K, DomainError, ExecutionState, ResumePoint, SessionId, StepRecord, StepStatus,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] DomainError),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Check if this error was caused by caller input rather than storage
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidArgument(_) | LedgerError::SessionNotFound(_)
        )
    }
}

/// Input for [`ExecutionLedger::initialize`]
#[derive(Debug, Clone)]
pub struct InitializeInput {
    pub session_id: SessionId,
    pub total_steps: u32,
    pub task_description: String,
    pub k: u32,
}

impl InitializeInput {
    pub fn new(session_id: SessionId, total_steps: u32, task_description: impl Into<String>) -> Self {
        Self {
            session_id,
            total_steps,
            task_description: task_description.into(),
            k: DEFAULT_MARGIN_K,
        }
    }

    pub fn with_k(mut self, k: u32) -> Self {
        self.k = k;
        self
    }
}

/// Input for [`ExecutionLedger::update_step`]
#[derive(Debug, Clone)]
pub struct UpdateStepInput {
    pub session_id: SessionId,
    pub step_id: String,
    pub status: StepStatus,
    pub winner: Option<Value>,
    pub votes: u64,
    pub margin: u64,
    pub red_flags: u64,
}

impl UpdateStepInput {
    pub fn new(session_id: SessionId, step_id: impl Into<String>, status: StepStatus) -> Self {
        Self {
            session_id,
            step_id: step_id.into(),
            status,
            winner: None,
            votes: 0,
            margin: 0,
            red_flags: 0,
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

/// Durable progress ledger for multi-step sessions
///
/// Generic over its storage so it can run against files or memory.
pub struct ExecutionLedger<S: ExecutionStateStore, A: StepAuditLog> {
    store: Arc<S>,
    audit: Arc<A>,
    policy: LedgerPolicy,
}

impl<S: ExecutionStateStore, A: StepAuditLog> ExecutionLedger<S, A> {
    pub fn new(store: Arc<S>, audit: Arc<A>) -> Self {
        Self {
            store,
            audit,
            policy: LedgerPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LedgerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Create a fresh state for the session.
    ///
    /// Any existing state for the same id is overwritten without merging.
    pub fn initialize(&self, input: InitializeInput) -> Result<ExecutionState, LedgerError> {
        let state = ExecutionState::new(
            input.session_id,
            input.total_steps,
            input.task_description,
            input.k,
            Utc::now(),
        )?;

        let _lock = self.store.lock(&state.session_id)?;
        if self.store.load(&state.session_id).ok().flatten().is_some() {
            warn!(session = %state.session_id, "Re-initializing session, prior progress discarded");
        }
        self.store.save(&state)?;

        info!(
            session = %state.session_id,
            total_steps = state.total_steps,
            k = state.k,
            "Session initialized"
        );
        Ok(state)
    }

    /// Load the session state, `None` if it was never initialized
    pub fn load(&self, session_id: &SessionId) -> Result<Option<ExecutionState>, LedgerError> {
        Ok(self.store.load(session_id)?)
    }

    /// Record the outcome (or progress) of one step.
    ///
    /// The state document is saved before the audit entry is appended. An
    /// audit failure is returned as an error even though the new state is
    /// already persisted; in cumulative mode, retrying the same call counts
    /// its votes and transition a second time.
    pub fn update_step(&self, input: UpdateStepInput) -> Result<ExecutionState, LedgerError> {
        let _lock = self.store.lock(&input.session_id)?;
        let mut state = self.load_or_shell(&input.session_id)?;

        let mut record = StepRecord::new(input.step_id, input.status, Utc::now()).with_counts(
            input.votes,
            input.margin,
            input.red_flags,
        );
        if let Some(winner) = input.winner {
            record = record.with_winner(winner);
        }

        if state.steps.contains_key(&record.step_id) {
            debug!(
                session = %state.session_id,
                step = %record.step_id,
                "Overwriting existing step record"
            );
        }

        state.apply_step(record.clone(), self.policy.metrics_mode);
        self.store.save(&state)?;
        self.audit.append(&state.session_id, &record)?;

        info!(
            session = %state.session_id,
            step = %record.step_id,
            status = %record.status,
            completed = state.current_step,
            total = state.total_steps,
            "Step recorded"
        );
        Ok(state)
    }

    /// Where to continue an interrupted session, `None` if it does not exist
    pub fn resume_point(&self, session_id: &SessionId) -> Result<Option<ResumePoint>, LedgerError> {
        Ok(self.store.load(session_id)?.map(|state| state.resume_point()))
    }

    /// Finalize the session as succeeded or failed
    pub fn mark_complete(
        &self,
        session_id: &SessionId,
        success: bool,
    ) -> Result<ExecutionState, LedgerError> {
        let _lock = self.store.lock(session_id)?;
        let mut state = self.load_or_shell(session_id)?;

        if state.status.is_terminal() {
            warn!(session = %session_id, previous = %state.status, "Session already completed");
        }
        state.complete(success, Utc::now());
        self.store.save(&state)?;

        info!(session = %session_id, status = %state.status, "Session completed");
        Ok(state)
    }

    /// The session's voting margin, or the default when no state exists
    pub fn margin_k(&self, session_id: &SessionId) -> Result<u32, LedgerError> {
        Ok(self
            .store
            .load(session_id)?
            .map(|state| state.k)
            .unwrap_or(DEFAULT_MARGIN_K))
    }

    fn load_or_shell(&self, session_id: &SessionId) -> Result<ExecutionState, LedgerError> {
        match (self.store.load(session_id)?, self.policy.on_missing_session) {
            (Some(state), _) => Ok(state),
            (None, MissingSessionPolicy::Fail) => {
                Err(LedgerError::SessionNotFound(session_id.clone()))
            }
            (None, MissingSessionPolicy::Create) => {
                warn!(session = %session_id, "Session not initialized, starting from an empty shell");
                Ok(ExecutionState::shell(session_id.clone(), Utc::now()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::audit_log::InMemoryAuditLog;
    use crate::ports::state_store::InMemoryStateStore;
    use maker_domain::{MetricsMode, SessionStatus};
    use serde_json::json;

    type Ledger = ExecutionLedger<InMemoryStateStore, InMemoryAuditLog>;

    fn ledger() -> (Ledger, Arc<InMemoryStateStore>, Arc<InMemoryAuditLog>) {
        let store = Arc::new(InMemoryStateStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        (
            ExecutionLedger::new(store.clone(), audit.clone()),
            store,
            audit,
        )
    }

    fn id(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    fn decided(session: &str, step: &str) -> UpdateStepInput {
        UpdateStepInput::new(id(session), step, StepStatus::Decided)
            .with_winner(json!({"action": step, "result": "ok"}))
            .with_counts(3, 3, 0)
    }

    #[test]
    fn test_initialize_persists_state() {
        let (ledger, store, _) = ledger();

        let state = ledger
            .initialize(InitializeInput::new(id("s1"), 5, "towers").with_k(4))
            .unwrap();

        assert_eq!(state.k, 4);
        assert_eq!(state.status, SessionStatus::InProgress);
        assert_eq!(store.load(&id("s1")).unwrap(), Some(state));
    }

    #[test]
    fn test_initialize_rejects_invalid_arguments() {
        let (ledger, store, _) = ledger();

        let err = ledger
            .initialize(InitializeInput::new(id("s1"), 0, "t"))
            .unwrap_err();
        assert!(err.is_usage_error());
        assert!(store.load(&id("s1")).unwrap().is_none());

        let err = ledger
            .initialize(InitializeInput::new(id("s1"), 3, "t").with_k(0))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidArgument(DomainError::InvalidMargin(0))
        ));
    }

    #[test]
    fn test_initialize_overwrites_existing_session() {
        let (ledger, _, _) = ledger();
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "first"))
            .unwrap();
        ledger.update_step(decided("s1", "step-1")).unwrap();

        let fresh = ledger
            .initialize(InitializeInput::new(id("s1"), 2, "second"))
            .unwrap();

        assert!(fresh.steps.is_empty());
        let loaded = ledger.load(&id("s1")).unwrap().unwrap();
        assert_eq!(loaded.task_description, "second");
        assert_eq!(loaded.metrics.completed_steps, 0);
    }

    #[test]
    fn test_load_absent_session() {
        let (ledger, _, _) = ledger();
        assert!(ledger.load(&id("missing")).unwrap().is_none());
        assert!(ledger.resume_point(&id("missing")).unwrap().is_none());
    }

    #[test]
    fn test_update_step_records_and_audits() {
        let (ledger, _, audit) = ledger();
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t"))
            .unwrap();

        let state = ledger.update_step(decided("s1", "step-1")).unwrap();

        assert_eq!(state.current_step, 1);
        assert_eq!(state.steps["step-1"].winner, Some(json!({"action": "step-1", "result": "ok"})));
        assert_eq!(state.metrics.total_votes_cast, 3);

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, id("s1"));
        assert_eq!(entries[0].1.step_id, "step-1");
    }

    #[test]
    fn test_repeated_updates_accumulate_metrics() {
        let (ledger, _, audit) = ledger();
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t"))
            .unwrap();

        ledger
            .update_step(
                UpdateStepInput::new(id("s1"), "step-1", StepStatus::Voting).with_counts(2, 0, 1),
            )
            .unwrap();
        let state = ledger.update_step(decided("s1", "step-1")).unwrap();

        assert_eq!(state.steps.len(), 1);
        assert_eq!(state.steps["step-1"].status, StepStatus::Decided);
        assert_eq!(state.metrics.total_votes_cast, 5);
        assert_eq!(state.metrics.red_flags, 1);
        assert_eq!(state.metrics.completed_steps, 1);
        assert_eq!(audit.entries().len(), 2);
    }

    #[test]
    fn test_repeated_huge_counts_do_not_overflow() {
        let (ledger, _, _) = ledger();
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t"))
            .unwrap();
        let huge = || {
            UpdateStepInput::new(id("s1"), "step-1", StepStatus::Voting).with_counts(
                u64::MAX,
                0,
                u64::MAX,
            )
        };

        ledger.update_step(huge()).unwrap();
        let state = ledger.update_step(huge()).unwrap();

        assert_eq!(state.metrics.total_votes_cast, u64::MAX);
        assert_eq!(state.metrics.red_flags, u64::MAX);
        assert_eq!(ledger.load(&id("s1")).unwrap().unwrap().metrics, state.metrics);
    }

    #[test]
    fn test_derived_metrics_policy() {
        let (ledger, _, _) = ledger();
        let ledger =
            ledger.with_policy(LedgerPolicy::default().with_metrics_mode(MetricsMode::Derived));
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t"))
            .unwrap();

        ledger.update_step(decided("s1", "step-1")).unwrap();
        let state = ledger.update_step(decided("s1", "step-1")).unwrap();

        assert_eq!(state.metrics.completed_steps, 1);
        assert_eq!(state.metrics.total_votes_cast, 3);
    }

    #[test]
    fn test_update_missing_session_fails_fast_by_default() {
        let (ledger, store, audit) = ledger();

        let err = ledger.update_step(decided("ghost", "step-1")).unwrap_err();

        assert!(matches!(err, LedgerError::SessionNotFound(ref s) if s.as_str() == "ghost"));
        assert!(store.load(&id("ghost")).unwrap().is_none());
        assert!(audit.entries().is_empty());
    }

    #[test]
    fn test_update_missing_session_creates_shell_when_allowed() {
        let (ledger, _, _) = ledger();
        let ledger = ledger.with_policy(
            LedgerPolicy::default().with_missing_session(MissingSessionPolicy::Create),
        );

        let state = ledger.update_step(decided("ghost", "step-1")).unwrap();

        assert_eq!(state.current_step, 1);
        assert_eq!(state.total_steps, 0);
        assert!(!ledger.resume_point(&id("ghost")).unwrap().unwrap().can_resume);
    }

    #[test]
    fn test_resume_point_before_and_after_completion() {
        let (ledger, _, _) = ledger();
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t"))
            .unwrap();
        for step in ["step-1", "step-2", "step-3"] {
            ledger.update_step(decided("s1", step)).unwrap();
        }

        let resume = ledger.resume_point(&id("s1")).unwrap().unwrap();
        assert_eq!(
            resume,
            ResumePoint {
                completed_steps: 3,
                total_steps: 5,
                next_step: 4,
                can_resume: true,
            }
        );

        let state = ledger.mark_complete(&id("s1"), true).unwrap();
        assert_eq!(state.status, SessionStatus::Success);
        assert!(state.completed_at.is_some());

        let resume = ledger.resume_point(&id("s1")).unwrap().unwrap();
        assert_eq!(resume.completed_steps, 3);
        assert!(!resume.can_resume);
    }

    #[test]
    fn test_mark_complete_failed() {
        let (ledger, _, _) = ledger();
        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t"))
            .unwrap();

        let state = ledger.mark_complete(&id("s1"), false).unwrap();
        assert_eq!(state.status, SessionStatus::Failed);
    }

    #[test]
    fn test_mark_complete_missing_session() {
        let (ledger, _, _) = ledger();
        assert!(matches!(
            ledger.mark_complete(&id("ghost"), true),
            Err(LedgerError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_margin_k() {
        let (ledger, _, _) = ledger();
        assert_eq!(ledger.margin_k(&id("s1")).unwrap(), DEFAULT_MARGIN_K);

        ledger
            .initialize(InitializeInput::new(id("s1"), 5, "t").with_k(7))
            .unwrap();
        assert_eq!(ledger.margin_k(&id("s1")).unwrap(), 7);
    }

    #[test]
    fn test_corrupt_state_is_storage_error() {
        let (ledger, store, _) = ledger();
        store.insert_raw(&id("s1"), "not json");

        let err = ledger.load(&id("s1")).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(ref e) if e.is_corrupt()));
        assert!(!err.is_usage_error());
        assert!(ledger.update_step(decided("s1", "step-1")).is_err());
    }
}
