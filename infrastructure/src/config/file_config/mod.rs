//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod ledger;
mod voting;

pub use ledger::FileLedgerConfig;
pub use voting::FileVotingConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("voting.k must be at least 1, got {0}")]
    InvalidMargin(u32),

    #[error("ledger.state_dir cannot be empty")]
    EmptyStateDir,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Voting settings
    pub voting: FileVotingConfig,
    /// Ledger settings
    pub ledger: FileLedgerConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.voting.k == 0 {
            return Err(ConfigValidationError::InvalidMargin(self.voting.k));
        }

        if let Some(dir) = &self.ledger.state_dir
            && dir.as_os_str().is_empty()
        {
            return Err(ConfigValidationError::EmptyStateDir);
        }

        Ok(())
    }
}
