//! Cast Vote use case
//!
//! Validates one proposal and appends it to the vote log as a single compact
//! line.

use crate::ports::state_store::StoreError;
use crate::ports::vote_log::VoteLog;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while casting a vote
#[derive(Error, Debug)]
pub enum CastVoteError {
    #[error("Invalid vote record: {0}")]
    InvalidRecord(#[source] serde_json::Error),

    #[error("Vote log error: {0}")]
    Storage(#[from] StoreError),
}

/// Use case for appending a proposal to the current step's votes
pub struct CastVoteUseCase<V: VoteLog> {
    votes: Arc<V>,
}

impl<V: VoteLog> CastVoteUseCase<V> {
    pub fn new(votes: Arc<V>) -> Self {
        Self { votes }
    }

    /// Append `raw` and return the compact form that was written.
    ///
    /// The record must parse as JSON. Embedded newlines are removed by the
    /// re-serialization so the record always occupies exactly one line.
    pub fn execute(&self, raw: &str) -> Result<String, CastVoteError> {
        let value: Value = serde_json::from_str(raw).map_err(CastVoteError::InvalidRecord)?;
        let line = value.to_string();
        self.votes.append(&line)?;
        debug!(bytes = line.len(), "Vote appended");
        Ok(line)
    }
}
