//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.
//! Each port ships an in-memory implementation so use cases can be tested
//! without touching the filesystem.

pub mod audit_log;
pub mod state_store;
pub mod vote_log;
