//! Voting configuration from TOML (`[voting]` section)

use maker_domain::{DEFAULT_MARGIN_K, DomainError, MarginRule};
use serde::{Deserialize, Serialize};

/// Raw voting configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVotingConfig {
    /// Margin used by `decide` when `--k` is not given
    pub k: u32,
}

impl Default for FileVotingConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_MARGIN_K,
        }
    }
}

impl FileVotingConfig {
    pub fn margin_rule(&self) -> Result<MarginRule, DomainError> {
        MarginRule::new(self.k)
    }
}
