//! Application-level configuration.
//!
//! - [`LedgerPolicy`]: retry accounting and unknown-session handling

pub mod ledger_policy;

pub use ledger_policy::{LedgerPolicy, MissingSessionPolicy};
