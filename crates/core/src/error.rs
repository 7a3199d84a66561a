//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures decided locally, before or instead of a backend call.
///
/// Transport and server-side failures are `auditdesk_client::ApiError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input rejected by a field rule (empty name, malformed email, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Lifecycle rule broken, e.g. completing a planned audit.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Missing, or outside the caller's organization.
    #[error("not found")]
    NotFound,

    /// Clashes with current state: duplicate company name, pending review.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Denied by the capability table.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Text shown next to the form or action that failed, without the
    /// variant prefix of `Display`.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Validation(m)
            | DomainError::InvariantViolation(m)
            | DomainError::InvalidId(m)
            | DomainError::Conflict(m) => m.clone(),
            DomainError::Unauthorized(m) => format!("Not allowed: {m}"),
            DomainError::NotFound => "Not found.".to_string(),
        }
    }
}
