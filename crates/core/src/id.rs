//! Record identifiers used across the domain.
//!
//! Upstream layers hand us ids either as numbers or as strings, so identity is
//! a scalar rather than a single strongly-typed representation. Comparison of
//! two ids goes through [`RecordId::loosely_eq`] and nowhere else.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque scalar identifier of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Create a new text identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer sequential ids in tests for
    /// determinism.
    pub fn new_v7() -> Self {
        Self::Text(Uuid::now_v7().to_string())
    }

    /// Value-only equality: `Int(5)` and `Text("5")` name the same record.
    pub fn loosely_eq(&self, other: &RecordId) -> bool {
        match (self, other) {
            (RecordId::Int(a), RecordId::Int(b)) => a == b,
            (RecordId::Text(a), RecordId::Text(b)) => a == b,
            (RecordId::Int(n), RecordId::Text(s)) | (RecordId::Text(s), RecordId::Int(n)) => {
                s.trim().parse::<i64>().is_ok_and(|parsed| parsed == *n)
            }
        }
    }

    /// Interpret a JSON scalar as an identifier.
    ///
    /// Non-scalar values and floats with a fractional part yield `None`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => n.as_i64().map(RecordId::Int),
            JsonValue::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            RecordId::Int(n) => JsonValue::from(*n),
            RecordId::Text(s) => JsonValue::from(s.as_str()),
        }
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordId::Int(n) => core::fmt::Display::fmt(n, f),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DomainError::invalid_id("RecordId: empty"));
        }
        Ok(s.parse::<i64>()
            .map(RecordId::Int)
            .unwrap_or_else(|_| RecordId::Text(s.to_string())))
    }
}

/// Loose equality between two JSON scalars, used by query matching.
///
/// Identifiers compare through [`RecordId::loosely_eq`]; everything else falls
/// back to structural equality.
pub fn json_loosely_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (RecordId::from_json(a), RecordId::from_json(b)) {
        (Some(a), Some(b)) => a.loosely_eq(&b),
        _ => a == b,
    }
}
