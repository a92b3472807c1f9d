//! Infrastructure layer for maker
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLedgerConfig, FileVotingConfig,
};
pub use logging::JsonlStepAuditLog;
pub use storage::{FileLock, FileStateStore, JsonlVoteLog};
