//! Port for the vote collection of the step currently being voted on.
//!
//! Producers append raw records; the tally reads them back in arrival order.
//! The log is cleared once the driver has consumed a decision.

use super::state_store::StoreError;
use std::sync::Mutex;

/// Ordered, append-only collection of raw vote records
pub trait VoteLog: Send + Sync {
    /// Append one record as a single unit; a record is never split
    fn append(&self, record: &str) -> Result<(), StoreError>;

    /// All records in arrival order. A missing log is an empty one.
    fn records(&self) -> Result<Vec<String>, StoreError>;

    /// Remove every record. Clearing an empty or missing log is a no-op.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory vote log for tests.
#[derive(Default)]
pub struct InMemoryVoteLog {
    records: Mutex<Vec<String>>,
}

impl InMemoryVoteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: Mutex::new(records.into_iter().map(Into::into).collect()),
        }
    }
}

impl VoteLog for InMemoryVoteLog {
    fn append(&self, record: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(record.to_string());
        Ok(())
    }

    fn records(&self) -> Result<Vec<String>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.clear();
        Ok(())
    }
}
