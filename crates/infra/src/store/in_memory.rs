use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Map, Value as JsonValue};

use rolegate_core::{Entity, Query, RecordId, UNIQUENESS, ValidationError, json_loosely_eq};

use super::r#trait::{EntityRecord, EntityStore, RecordStore};
use crate::StoreError;
use crate::config::IdStrategy;

/// Hands out record identifiers according to an [`IdStrategy`].
#[derive(Debug)]
pub struct IdAllocator {
    strategy: IdStrategy,
    next: AtomicI64,
}

impl IdAllocator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            next: AtomicI64::new(1),
        }
    }

    pub fn next_id(&self) -> RecordId {
        match self.strategy {
            IdStrategy::Sequential => RecordId::Int(self.next.fetch_add(1, Ordering::Relaxed)),
            IdStrategy::Uuid => RecordId::new_v7(),
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}

fn poisoned() -> StoreError {
    StoreError::storage("lock poisoned")
}

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance: every query scans
/// and renders records to JSON.
#[derive(Debug)]
pub struct InMemoryRecordStore<R> {
    records: RwLock<Vec<R>>,
    ids: IdAllocator,
}

impl<R> InMemoryRecordStore<R> {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            ids: IdAllocator::new(strategy),
        }
    }
}

impl<R> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}

fn unique_conflicts<R: Entity>(
    existing: &[R],
    candidate: &JsonValue,
) -> Result<ValidationError, StoreError> {
    let mut err = ValidationError::new(R::MODEL);
    for field in R::unique_fields() {
        let value = match candidate.get(*field) {
            None | Some(JsonValue::Null) => continue,
            Some(v) => v,
        };
        for record in existing {
            let rendered = serde_json::to_value(record)?;
            if rendered.get(*field).is_some_and(|v| json_loosely_eq(v, value)) {
                err.add(field, UNIQUENESS, "is not unique");
                break;
            }
        }
    }
    Ok(err)
}

#[async_trait::async_trait]
impl<R: Entity> RecordStore<R> for InMemoryRecordStore<R> {
    async fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
        let record = R::from_draft(self.ids.next_id(), draft);
        record.validate()?;
        let rendered = serde_json::to_value(&record)?;

        // Uniqueness check and insert under one write lock.
        let mut records = self.records.write().map_err(|_| poisoned())?;
        unique_conflicts(&records, &rendered)?.into_result()?;
        records.push(record.clone());

        Ok(record)
    }

    async fn find(&self, query: &Query) -> Result<Vec<R>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let limit = query.limit.unwrap_or(usize::MAX);

        let mut out = Vec::new();
        for record in records.iter() {
            if out.len() >= limit {
                break;
            }
            let rendered = serde_json::to_value(record)?;
            if !query.matches(&rendered) {
                continue;
            }
            if query.fields.is_some() {
                out.push(serde_json::from_value(query.project_keeping(rendered, R::required_fields()))?);
            } else {
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<R>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.iter().find(|r| r.id().loosely_eq(id)).cloned())
    }
}

/// In-memory store of untyped model instances, keyed by model class.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    models: RwLock<HashMap<String, Vec<EntityRecord>>>,
    ids: IdAllocator,
}

impl InMemoryEntityStore {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            ids: IdAllocator::new(strategy),
        }
    }

    /// Insert an instance of `model`. An `id` attribute, if present, is discarded.
    pub fn insert(&self, model: &str, attributes: JsonValue) -> Result<EntityRecord, StoreError> {
        let mut attributes = match attributes {
            JsonValue::Object(map) => map,
            JsonValue::Null => Map::new(),
            other => {
                return Err(StoreError::Serialization(format!(
                    "entity attributes must be an object, got {other}"
                )));
            }
        };
        attributes.remove("id");

        let record = EntityRecord {
            id: self.ids.next_id(),
            attributes,
        };
        let mut models = self.models.write().map_err(|_| poisoned())?;
        models.entry(model.to_string()).or_default().push(record.clone());
        Ok(record)
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_entity(&self, model: &str, id: &RecordId) -> Result<Option<EntityRecord>, StoreError> {
        let models = self.models.read().map_err(|_| poisoned())?;
        Ok(models
            .get(model)
            .and_then(|records| records.iter().find(|r| r.id.loosely_eq(id)))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_auth::{NewRole, NewRoleMapping, NewUser, Role, RoleMapping, USER, User};
    use rolegate_core::PRESENCE;
    use serde_json::json;

    #[tokio::test]
    async fn sequential_ids_start_at_one() {
        let store = InMemoryRecordStore::<Role>::default();
        let a = store.create(NewRole::new("a")).await.unwrap();
        let b = store.create(NewRole::new("b")).await.unwrap();
        assert_eq!(a.id, RecordId::Int(1));
        assert_eq!(b.id, RecordId::Int(2));
    }

    #[tokio::test]
    async fn uuid_ids_are_text() {
        let store = InMemoryRecordStore::<Role>::new(IdStrategy::Uuid);
        let role = store.create(NewRole::new("a")).await.unwrap();
        let RecordId::Text(raw) = &role.id else {
            panic!("expected text id, got {:?}", role.id);
        };
        let parsed = uuid::Uuid::parse_str(raw).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[tokio::test]
    async fn unique_fields_are_enforced() {
        let store = InMemoryRecordStore::<Role>::default();
        store.create(NewRole::new("admin")).await.unwrap();

        let err = store.create(NewRole::new("admin")).await.unwrap_err();
        let validation = err.validation().expect("validation error");
        assert!(validation.has_code("name", UNIQUENESS));
        assert_eq!(store.find(&Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn absent_unique_values_do_not_conflict() {
        let store = InMemoryRecordStore::<User>::default();
        store.create(NewUser::new().name("a")).await.unwrap();
        store.create(NewUser::new().name("b")).await.unwrap();
        assert_eq!(store.find(&Query::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn record_validation_runs_before_insert() {
        let store = InMemoryRecordStore::<Role>::default();
        let err = store.create(NewRole::new("")).await.unwrap_err();
        assert!(err.validation().unwrap().has_code("name", PRESENCE));
    }

    #[tokio::test]
    async fn find_applies_filter_limit_and_projection() {
        let store = InMemoryRecordStore::<User>::default();
        store
            .create(NewUser::new().username("john").email("john@gmail.com"))
            .await
            .unwrap();
        store
            .create(NewUser::new().username("mary").email("mary@gmail.com"))
            .await
            .unwrap();

        let found = store.find(&Query::new().eq("username", "mary")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email.as_deref(), Some("mary@gmail.com"));

        let limited = store.find(&Query::new().limit(1)).await.unwrap();
        assert_eq!(limited[0].username.as_deref(), Some("john"));

        let projected = store.find(&Query::new().fields(["username"])).await.unwrap();
        assert_eq!(projected.len(), 2);
        assert!(projected.iter().all(|u| u.email.is_none()));
    }

    #[tokio::test]
    async fn projection_never_rewrites_role_timestamps() {
        let store = InMemoryRecordStore::<Role>::default();
        let role = store.create(NewRole::new("admin").description("all")).await.unwrap();

        let projected = store.find(&Query::new().fields(["name"])).await.unwrap();
        assert_eq!(projected[0].name, "admin");
        assert_eq!(projected[0].description, None);
        assert_eq!(projected[0].created, role.created);
        assert_eq!(projected[0].modified, role.modified);
    }

    #[tokio::test]
    async fn projected_mappings_still_load() {
        let store = InMemoryRecordStore::<RoleMapping>::default();
        let mapping = store
            .create(NewRoleMapping {
                role_id: RecordId::Int(2),
                principal_type: USER,
                principal_id: RecordId::Int(7),
            })
            .await
            .unwrap();

        let projected = store.find(&Query::new().fields(["principalId"])).await.unwrap();
        assert_eq!(projected, vec![mapping]);
    }

    #[tokio::test]
    async fn find_by_id_is_loose() {
        let store = InMemoryRecordStore::<Role>::default();
        let role = store.create(NewRole::new("a")).await.unwrap();
        let found = store.find_by_id(&RecordId::from("1")).await.unwrap();
        assert_eq!(found, Some(role));
        assert!(store.find_by_id(&RecordId::Int(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entity_store_is_scoped_by_model() {
        let store = InMemoryEntityStore::default();
        let album = store
            .insert("Album", json!({"name": "Album 1", "userId": 1, "id": 99}))
            .unwrap();

        assert_eq!(album.id, RecordId::Int(1));
        let loaded = store.find_entity("Album", &RecordId::Int(1)).await.unwrap().unwrap();
        assert_eq!(loaded.id_attribute("userId"), Some(RecordId::Int(1)));
        assert!(store.find_entity("Photo", &RecordId::Int(1)).await.unwrap().is_none());
        assert!(store.insert("Album", json!(3)).is_err());
    }
}
