//! # Approval Workflow
//!
//! The job lifecycle and approval-request state machine. Every transition
//! runs as one transaction per job: read current statuses, validate, write
//! the new statuses plus the audit log row, commit. The job view cache is
//! invalidated after commit, best-effort.

mod service;

pub use service::{ApprovalService, JobEditPayload, NewJobInput};
