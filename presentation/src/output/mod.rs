//! Output formatting for CLI results
//!
//! Every command prints compact JSON except `ledger report`.

pub mod json;
pub mod report;
