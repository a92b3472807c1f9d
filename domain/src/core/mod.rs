//! Core domain concepts shared across all subdomains.
//!
//! - [`session_id::SessionId`]: validated session identifier
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod session_id;
