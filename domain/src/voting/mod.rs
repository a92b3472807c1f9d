//! K-ahead voting domain
//!
//! Repeated, independently produced proposals for one decision point are
//! collected as ballots. A candidate wins once it leads the runner-up by at
//! least `k` votes ("first-to-ahead-by-K").
//!
//! # Flow
//!
//! ```text
//! raw records ──▶ Ballot::parse ──▶ CanonicalKey ──▶ Tally ──▶ MarginRule ──▶ Decision
//!   (jsonl)        (drop invalid)   (action,result)  (ranked)    (k-ahead)
//! ```
//!
//! Malformed records are never votes. Ties in the ranking are broken by the
//! order in which each candidate was first seen.

pub mod ballot;
pub mod rule;
pub mod tally;

// Re-export main types
pub use ballot::{Ballot, CanonicalKey, normalize};
pub use rule::{DEFAULT_MARGIN_K, MarginRule, SINGLE_CANDIDATE_POLICY, SingleCandidatePolicy};
pub use tally::{CandidateCount, Decision, Standing, Tally, Verdict, decide};
