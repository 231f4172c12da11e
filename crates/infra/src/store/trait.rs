use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use rolegate_core::{Entity, Query, RecordId};

use crate::StoreError;

/// Generic record store for one entity type.
///
/// ## Semantics
///
/// - `create` assigns the identifier, validates the record and enforces the
///   entity's unique fields atomically with the insert
/// - `find` applies the query's filter, limit and field projection, returning
///   records in insertion order
/// - `find_by_id` compares identifiers loosely (`5` finds `"5"`)
///
/// Absence is never an error: missing records are `None` / empty vectors.
#[async_trait::async_trait]
pub trait RecordStore<R: Entity>: Send + Sync {
    async fn create(&self, draft: R::Draft) -> Result<R, StoreError>;

    async fn find(&self, query: &Query) -> Result<Vec<R>, StoreError>;

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<R>, StoreError>;

    /// First record matching `query`.
    async fn find_one(&self, query: &Query) -> Result<Option<R>, StoreError> {
        let query = query.clone().limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }
}

/// Untyped persisted entity, as loaded for ownership checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub attributes: Map<String, JsonValue>,
}

impl EntityRecord {
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.attributes.get(field)
    }

    /// The attribute read as an identifier (null/absent/non-scalar → `None`).
    pub fn id_attribute(&self, field: &str) -> Option<RecordId> {
        self.get(field).and_then(RecordId::from_json)
    }
}

/// Lookup of arbitrary model instances by model class and id.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_entity(&self, model: &str, id: &RecordId) -> Result<Option<EntityRecord>, StoreError>;
}
