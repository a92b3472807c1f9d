//! Presentation layer for maker
//!
//! This crate contains CLI definitions and output formatters.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, GlobalArgs, LedgerCommand, MathCommand};
pub use output::report::{ReportFormatter, TextReport};
