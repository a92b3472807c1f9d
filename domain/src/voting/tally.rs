//! K-ahead vote tallying
//!
//! Counts ballots for one decision point and reports whether a winner has
//! emerged under a [`MarginRule`].

use super::ballot::{Ballot, CanonicalKey};
use super::rule::MarginRule;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// Votes gathered by one distinct candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCount {
    pub key: CanonicalKey,
    pub count: usize,
    /// Position of the first ballot for this candidate among valid ballots
    pub first_seen: usize,
    /// The earliest raw record for this candidate, decoded
    pub representative: Value,
}

/// A declared winner
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub winner: Value,
    /// Votes for the winning candidate
    pub votes: usize,
    pub margin: usize,
    pub candidates: usize,
    pub k: u32,
}

/// Standing of a race that has no winner yet
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// Total valid votes
    pub votes: usize,
    pub leader_count: usize,
    pub candidates: usize,
    pub k: u32,
}

/// Outcome of tallying a vote collection
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The collection holds no valid ballot
    NoValidVotes,
    /// Nobody leads by `k` yet
    Pending(Standing),
    /// A candidate leads by at least `k`
    Decided(Verdict),
}

impl Decision {
    pub fn is_decided(&self) -> bool {
        matches!(self, Decision::Decided(_))
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Decision::Decided(verdict) => Some(verdict),
            _ => None,
        }
    }

    /// Number of votes reported for this decision
    pub fn votes(&self) -> usize {
        match self {
            Decision::NoValidVotes => 0,
            Decision::Pending(standing) => standing.votes,
            Decision::Decided(verdict) => verdict.votes,
        }
    }

    /// Reason string for undecided outcomes
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Decision::NoValidVotes => Some("no valid votes"),
            Decision::Pending(_) => Some("no k-ahead winner yet"),
            Decision::Decided(_) => None,
        }
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Decision::NoValidVotes => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("decided", &false)?;
                map.serialize_entry("votes", &0)?;
                map.serialize_entry("reason", &self.reason())?;
                map.end()
            }
            Decision::Pending(standing) => {
                let mut map = serializer.serialize_map(Some(6))?;
                map.serialize_entry("decided", &false)?;
                map.serialize_entry("votes", &standing.votes)?;
                map.serialize_entry("leader_count", &standing.leader_count)?;
                map.serialize_entry("candidates", &standing.candidates)?;
                map.serialize_entry("k", &standing.k)?;
                map.serialize_entry("reason", &self.reason())?;
                map.end()
            }
            Decision::Decided(verdict) => {
                let mut map = serializer.serialize_map(Some(6))?;
                map.serialize_entry("decided", &true)?;
                map.serialize_entry("winner", &verdict.winner)?;
                map.serialize_entry("votes", &verdict.votes)?;
                map.serialize_entry("margin", &verdict.margin)?;
                map.serialize_entry("candidates", &verdict.candidates)?;
                map.serialize_entry("k", &verdict.k)?;
                map.end()
            }
        }
    }
}

/// Ranked vote counts for one decision point
///
/// Candidates are ordered by count descending; equal counts keep the order in
/// which each candidate was first seen, so ranking never depends on hash
/// iteration order.
///
/// # Example
///
/// ```
/// use maker_domain::voting::{MarginRule, Tally};
///
/// let a = r#"{"action":"a","result":"1"}"#;
/// let b = r#"{"action":"b","result":"2"}"#;
/// let tally = Tally::from_records([a, a, a, a, b]);
///
/// let decision = tally.decide(&MarginRule::new(3).unwrap());
/// assert!(decision.is_decided());
/// assert_eq!(decision.verdict().unwrap().margin, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tally {
    ranked: Vec<CandidateCount>,
    valid: usize,
    discarded: usize,
}

impl Tally {
    /// Build a tally from raw records in arrival order.
    ///
    /// Blank and unparsable records are discarded and never counted.
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates: Vec<CandidateCount> = Vec::new();
        let mut index: HashMap<CanonicalKey, usize> = HashMap::new();
        let mut valid = 0;
        let mut discarded = 0;

        for raw in records {
            let raw = raw.as_ref();
            let Some(ballot) = Ballot::parse(raw) else {
                if !raw.trim().is_empty() {
                    discarded += 1;
                }
                continue;
            };

            match index.get(ballot.key()) {
                Some(&slot) => candidates[slot].count += 1,
                None => {
                    index.insert(ballot.key().clone(), candidates.len());
                    let key = ballot.key().clone();
                    candidates.push(CandidateCount {
                        key,
                        count: 1,
                        first_seen: valid,
                        representative: ballot.into_record(),
                    });
                }
            }
            valid += 1;
        }

        // Stable sort: candidates were pushed in first-seen order
        candidates.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            ranked: candidates,
            valid,
            discarded,
        }
    }

    /// Total valid ballots
    pub fn valid_votes(&self) -> usize {
        self.valid
    }

    /// Non-blank records that failed to parse
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn leader(&self) -> Option<&CandidateCount> {
        self.ranked.first()
    }

    pub fn runner_up(&self) -> Option<&CandidateCount> {
        self.ranked.get(1)
    }

    /// Apply the margin rule to the current counts
    pub fn decide(&self, rule: &MarginRule) -> Decision {
        let Some(leader) = self.leader() else {
            return Decision::NoValidVotes;
        };
        let runner_up = self.runner_up().map(|c| c.count);

        if rule.is_satisfied(leader.count, runner_up) {
            Decision::Decided(Verdict {
                winner: leader.representative.clone(),
                votes: leader.count,
                margin: rule.margin(leader.count, runner_up),
                candidates: self.ranked.len(),
                k: rule.k(),
            })
        } else {
            Decision::Pending(Standing {
                votes: self.valid,
                leader_count: leader.count,
                candidates: self.ranked.len(),
                k: rule.k(),
            })
        }
    }
}

/// Tally `records` and apply `rule` in one step
pub fn decide<I, S>(records: I, rule: &MarginRule) -> Decision
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Tally::from_records(records).decide(rule)
}
