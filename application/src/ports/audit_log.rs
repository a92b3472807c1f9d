//! Port for the per-session step audit trail.
//!
//! Every ledger update appends the [`StepRecord`] it wrote. Unlike the state
//! document, which keeps only the latest record per step, the trail keeps
//! every write.

use super::state_store::StoreError;
use maker_domain::{SessionId, StepRecord};
use std::sync::Mutex;

/// Append-only log of step records
pub trait StepAuditLog: Send + Sync {
    /// Record one step update
    fn append(&self, session_id: &SessionId, record: &StepRecord) -> Result<(), StoreError>;
}

/// No-op implementation for when auditing is disabled.
pub struct NoAuditLog;

impl StepAuditLog for NoAuditLog {
    fn append(&self, _session_id: &SessionId, _record: &StepRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Collects entries in memory, for tests.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<(SessionId, StepRecord)>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far
    pub fn entries(&self) -> Vec<(SessionId, StepRecord)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl StepAuditLog for InMemoryAuditLog {
    fn append(&self, session_id: &SessionId, record: &StepRecord) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.push((session_id.clone(), record.clone()));
        Ok(())
    }
}
