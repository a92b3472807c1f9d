//! Ledger policy: how the ledger handles retries and unknown sessions.
//!
//! [`LedgerPolicy`] groups the knobs that change ledger semantics without
//! changing the stored document format.

use maker_domain::MetricsMode;
use serde::{Deserialize, Serialize};

/// What `update` and `complete` do when the session was never initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingSessionPolicy {
    /// Return `SessionNotFound` without writing anything
    #[default]
    Fail,
    /// Start from an empty shell state and carry on
    Create,
}

/// Ledger behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    pub on_missing_session: MissingSessionPolicy,
    pub metrics_mode: MetricsMode,
}

impl LedgerPolicy {
    // ==================== Builder Methods ====================

    pub fn with_missing_session(mut self, policy: MissingSessionPolicy) -> Self {
        self.on_missing_session = policy;
        self
    }

    pub fn with_metrics_mode(mut self, mode: MetricsMode) -> Self {
        self.metrics_mode = mode;
        self
    }
}
