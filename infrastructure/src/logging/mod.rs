//! Logging infrastructure: the per-session step audit trail.
//!
//! Provides [`JsonlStepAuditLog`], a JSONL file writer that implements
//! the [`StepAuditLog`](maker_application::StepAuditLog) port.

mod jsonl_audit_log;

pub use jsonl_audit_log::JsonlStepAuditLog;
