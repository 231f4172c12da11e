//! Built-in role strategies.
//!
//! EVERYONE/AUTHENTICATED/UNAUTHENTICATED inspect the context only. OWNER
//! loads the target entity and scans its foreign keys.

use std::sync::Arc;

use tracing::debug;

use rolegate_auth::{PrincipalType, RoleContext, RoleIdentifier};
use rolegate_core::RecordId;

use super::RoleStrategy;
use crate::ResolveError;
use crate::model::ModelRegistry;
use crate::store::{EntityRecord, EntityStore};

/// Conventional owner attributes consulted for USER principals when a model
/// declares no belongs-to relation to the user model. The first one set wins.
const CONVENTIONAL_OWNER_KEYS: [&str; 2] = ["userId", "owner"];

#[derive(Debug)]
enum OwnerKeys {
    /// Declared belongs-to foreign keys; any of them may match.
    Declared(Vec<String>),
    Conventional,
}

impl OwnerKeys {
    fn matches(&self, entity: &EntityRecord, principal_id: &RecordId) -> bool {
        match self {
            OwnerKeys::Declared(keys) => keys
                .iter()
                .filter_map(|key| entity.id_attribute(key))
                .any(|value| value.loosely_eq(principal_id)),
            OwnerKeys::Conventional => CONVENTIONAL_OWNER_KEYS
                .iter()
                .find_map(|key| entity.id_attribute(key))
                .is_some_and(|value| value.loosely_eq(principal_id)),
        }
    }
}

pub struct EveryoneStrategy;

#[async_trait::async_trait]
impl RoleStrategy for EveryoneStrategy {
    async fn resolve(&self, _role: &RoleIdentifier, _context: &RoleContext) -> Result<bool, ResolveError> {
        Ok(true)
    }
}

pub struct AuthenticatedStrategy;

#[async_trait::async_trait]
impl RoleStrategy for AuthenticatedStrategy {
    async fn resolve(&self, _role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        Ok(context.is_authenticated())
    }
}

pub struct UnauthenticatedStrategy;

#[async_trait::async_trait]
impl RoleStrategy for UnauthenticatedStrategy {
    async fn resolve(&self, _role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        Ok(context.is_unauthenticated())
    }
}

/// Ownership through foreign keys on the target entity.
pub struct OwnerStrategy {
    entities: Arc<dyn EntityStore>,
    models: Arc<ModelRegistry>,
}

impl OwnerStrategy {
    pub fn new(entities: Arc<dyn EntityStore>, models: Arc<ModelRegistry>) -> Self {
        Self { entities, models }
    }

    fn owner_keys(&self, model_class: &str, principal_type: PrincipalType) -> OwnerKeys {
        let keys = self.models.belongs_to_keys(model_class, principal_type.model());
        if keys.is_empty() && principal_type == PrincipalType::User {
            return OwnerKeys::Conventional;
        }
        OwnerKeys::Declared(keys)
    }
}

#[async_trait::async_trait]
impl RoleStrategy for OwnerStrategy {
    async fn resolve(&self, _role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        let Some((model_class, model_id, principal_id)) = context.owner_target() else {
            debug!("owner check without model or principal");
            return Ok(false);
        };

        // The principal's own record is owned by the principal.
        if self.models.is_a(model_class, context.principal_type.model()) {
            return Ok(model_id.loosely_eq(principal_id));
        }

        let Some(entity) = self.entities.find_entity(model_class, model_id).await? else {
            debug!(model = model_class, id = %model_id, "owner check target not found");
            return Ok(false);
        };

        let keys = self.owner_keys(model_class, context.principal_type);
        let owned = keys.matches(&entity, principal_id);
        debug!(model = model_class, id = %model_id, ?keys, owned, "owner check");
        Ok(owned)
    }
}
