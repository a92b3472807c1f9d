//! Decide Step use case
//!
//! Tallies the vote collection of the current step and, once a winner is
//! declared, optionally clears the collection for the next step.

use crate::ports::state_store::StoreError;
use crate::ports::vote_log::VoteLog;
use maker_domain::{Decision, MarginRule, Tally};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while deciding a step
#[derive(Error, Debug)]
pub enum DecideStepError {
    #[error("Vote log error: {0}")]
    Storage(#[from] StoreError),
}

/// Input for the DecideStep use case
#[derive(Debug, Clone, Copy)]
pub struct DecideStepInput {
    pub rule: MarginRule,
    /// Empty the vote log after a winner is declared
    pub clear_on_decision: bool,
}

impl DecideStepInput {
    pub fn new(rule: MarginRule) -> Self {
        Self {
            rule,
            clear_on_decision: false,
        }
    }

    pub fn clearing(mut self) -> Self {
        self.clear_on_decision = true;
        self
    }
}

/// Use case for deciding one step from its collected votes
pub struct DecideStepUseCase<V: VoteLog> {
    votes: Arc<V>,
}

impl<V: VoteLog> DecideStepUseCase<V> {
    pub fn new(votes: Arc<V>) -> Self {
        Self { votes }
    }

    pub fn execute(&self, input: DecideStepInput) -> Result<Decision, DecideStepError> {
        let records = self.votes.records()?;
        let tally = Tally::from_records(&records);

        if tally.discarded() > 0 {
            debug!(
                discarded = tally.discarded(),
                "Skipped records that are not valid JSON"
            );
        }

        let decision = tally.decide(&input.rule);
        match &decision {
            Decision::Decided(verdict) => {
                info!(
                    votes = verdict.votes,
                    margin = verdict.margin,
                    candidates = verdict.candidates,
                    k = verdict.k,
                    "Step decided"
                );
                if input.clear_on_decision {
                    self.votes.clear()?;
                    debug!("Vote log cleared");
                }
            }
            Decision::Pending(standing) => {
                debug!(
                    votes = standing.votes,
                    leader = standing.leader_count,
                    candidates = standing.candidates,
                    "No winner yet"
                );
            }
            Decision::NoValidVotes => debug!("No valid votes collected"),
        }

        Ok(decision)
    }
}
