//! Domain error model.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Rule code for a value that must be unique across a model.
pub const UNIQUENESS: &str = "uniqueness";

/// Rule code for a value that must be present and non-blank.
pub const PRESENCE: &str = "presence";

/// Field-level validation failure.
///
/// `codes` maps each offending field to the rules it violated, so callers can
/// check e.g. `codes["name"]` contains `"uniqueness"` without parsing messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub model: String,
    pub codes: BTreeMap<String, Vec<String>>,
    pub messages: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Record a violated rule for `field`.
    pub fn with(mut self, field: &str, code: &str, message: impl Into<String>) -> Self {
        self.add(field, code, message);
        self
    }

    pub fn add(&mut self, field: &str, code: &str, message: impl Into<String>) {
        self.codes
            .entry(field.to_string())
            .or_default()
            .push(code.to_string());
        self.messages
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether `field` violated the rule `code`.
    pub fn has_code(&self, field: &str, code: &str) -> bool {
        self.codes
            .get(field)
            .is_some_and(|codes| codes.iter().any(|c| c == code))
    }

    /// HTTP-style status code surfaced to API layers.
    pub fn status_code(&self) -> u16 {
        422
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "the `{}` instance is not valid", self.model)?;
        let mut sep = ": ";
        for (field, messages) in &self.messages {
            for message in messages {
                write!(f, "{sep}`{field}` {message}")?;
                sep = "; ";
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, malformed ids).
/// Storage faults belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A record failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            DomainError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_field() {
        let err = ValidationError::new("Role")
            .with("name", UNIQUENESS, "is not unique")
            .with("name", PRESENCE, "can't be blank");

        assert!(err.has_code("name", UNIQUENESS));
        assert!(err.has_code("name", PRESENCE));
        assert!(!err.has_code("description", PRESENCE));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn display_lists_messages() {
        let err = ValidationError::new("Role").with("name", UNIQUENESS, "is not unique");
        assert_eq!(
            err.to_string(),
            "the `Role` instance is not valid: `name` is not unique"
        );
    }

    #[test]
    fn empty_error_is_ok() {
        assert!(ValidationError::new("Role").into_result().is_ok());
    }
}
