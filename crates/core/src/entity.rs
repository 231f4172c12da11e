//! Entity trait: identity + continuity across state changes.

use serde::{Serialize, de::DeserializeOwned};

use crate::{RecordId, ValidationError};

/// A persisted record kind, as seen by generic record stores.
///
/// Stores assign identifiers: callers hand over a `Draft` and get the entity
/// back with its id set.
pub trait Entity: Clone + core::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Attributes supplied by the caller on creation.
    type Draft: Send + 'static;

    /// Model name (used in validation errors and model introspection).
    const MODEL: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &RecordId;

    /// Materialize a draft under the identifier chosen by the store.
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// Fields whose values must be unique across all records of this model.
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Fields kept by every projection because the record cannot be rebuilt
    /// without them.
    fn required_fields() -> &'static [&'static str] {
        &[]
    }

    /// Record-local validation (presence, format). Uniqueness is the store's job.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
