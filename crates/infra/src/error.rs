//! Infrastructure-facing error types.

use thiserror::Error;

use rolegate_core::{DomainError, ValidationError};

/// Failure reported by a backing record store (collaborator failure).
///
/// Propagated verbatim to callers: the core performs no retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Rejected write (presence, uniqueness, malformed id).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage/transport fault.
    #[error("storage error: {0}")]
    Storage(String),

    /// A record could not be rendered to or read back from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// The validation failure, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            StoreError::Domain(e) => e.as_validation(),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Domain(DomainError::Validation(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

/// Role resolution failure.
///
/// "Not found" conditions never show up here; they resolve to `false`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A registered strategy returned an error.
    #[error("role strategy '{role}' failed: {cause:#}")]
    Strategy { role: String, cause: anyhow::Error },

    /// A callback-style strategy dropped its completion handle unanswered.
    #[error("role strategy '{0}' dropped its completion handle without answering")]
    Abandoned(String),
}
