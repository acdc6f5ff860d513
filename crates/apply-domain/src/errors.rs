//! Domain errors

use thiserror::Error;

/// Domain errors for the apply orchestrator.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("session already exists for job_key {job_key}")]
    SessionAlreadyExists { job_key: String },

    #[error("no session for job_key {job_key}")]
    SessionNotFound { job_key: String },

    #[error("apply-serialization lease unavailable")]
    LeaseBusy,

    #[error("unknown platform {platform}")]
    UnknownPlatform { platform: String },

    #[error("job {job_key} already applied (status: {status})")]
    AlreadyApplied { job_key: String, status: String },

    #[error("confirmation timed out after {seconds}s")]
    ConfirmationTimedOut { seconds: u64 },

    #[error("confirmation cancelled")]
    ConfirmationCancelled,

    #[error("invalid state transition: cannot transition from {current_state} via {attempted_transition}")]
    InvalidTransition {
        current_state: String,
        attempted_transition: String,
    },

    #[error("job_key must not be empty")]
    EmptyJobKey,
}
