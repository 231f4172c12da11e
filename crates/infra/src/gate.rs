//! Service wiring: stores, registries, engine and facade behind one handle.

use std::sync::Arc;

use rolegate_auth::{Application, Role, RoleContext, RoleIdentifier, RoleMapping, User};
use rolegate_core::RecordId;

use crate::acl::Acl;
use crate::config::{IdStrategy, RolegateConfig};
use crate::directory::PrincipalDirectory;
use crate::engine::RoleEngine;
use crate::model::ModelRegistry;
use crate::registry::RoleRegistry;
use crate::resolver::{ResolverRegistry, RoleStrategy};
use crate::store::{EntityStore, InMemoryEntityStore, InMemoryRecordStore, RecordStore};
use crate::ResolveError;

/// Collaborator stores consumed by the services.
#[derive(Clone)]
pub struct Stores {
    pub roles: Arc<dyn RecordStore<Role>>,
    pub mappings: Arc<dyn RecordStore<RoleMapping>>,
    pub users: Arc<dyn RecordStore<User>>,
    pub applications: Arc<dyn RecordStore<Application>>,
    pub entities: Arc<dyn EntityStore>,
}

impl Stores {
    pub fn in_memory(strategy: IdStrategy) -> Self {
        Self {
            roles: Arc::new(InMemoryRecordStore::<Role>::new(strategy)),
            mappings: Arc::new(InMemoryRecordStore::<RoleMapping>::new(strategy)),
            users: Arc::new(InMemoryRecordStore::<User>::new(strategy)),
            applications: Arc::new(InMemoryRecordStore::<Application>::new(strategy)),
            entities: Arc::new(InMemoryEntityStore::new(strategy)),
        }
    }

    pub fn with_entities(mut self, entities: Arc<dyn EntityStore>) -> Self {
        self.entities = entities;
        self
    }
}

/// Role-based access control over one set of stores.
///
/// Every instance owns its resolver registry; two instances never share
/// registered strategies.
pub struct Rolegate {
    config: RolegateConfig,
    stores: Stores,
    models: Arc<ModelRegistry>,
    roles: RoleRegistry,
    engine: Arc<RoleEngine>,
    acl: Acl,
}

impl Rolegate {
    pub fn new(stores: Stores, models: Arc<ModelRegistry>, config: RolegateConfig) -> Self {
        let resolvers = Arc::new(ResolverRegistry::with_builtins(
            stores.entities.clone(),
            models.clone(),
        ));
        let engine = Arc::new(RoleEngine::new(
            stores.roles.clone(),
            stores.mappings.clone(),
            resolvers,
            &config,
        ));
        let roles = RoleRegistry::new(
            stores.roles.clone(),
            stores.mappings.clone(),
            stores.users.clone(),
            stores.applications.clone(),
        );
        let directory = Arc::new(PrincipalDirectory::new(
            stores.users.clone(),
            stores.applications.clone(),
            stores.roles.clone(),
        ));
        let acl = Acl::new(directory, engine.clone());

        Self {
            config,
            stores,
            models,
            roles,
            engine,
            acl,
        }
    }

    /// In-memory stores and the built-in model definitions.
    pub fn in_memory(config: RolegateConfig) -> Self {
        let stores = Stores::in_memory(config.id_strategy);
        Self::new(stores, Arc::new(ModelRegistry::with_builtin_models()), config)
    }

    pub fn config(&self) -> &RolegateConfig {
        &self.config
    }

    /// Install process-wide tracing using this instance's `log_filter`.
    pub fn init_tracing(&self) {
        self.config.init_tracing();
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn engine(&self) -> &RoleEngine {
        &self.engine
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        self.engine.resolvers()
    }

    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    pub fn register_resolver(
        &self,
        identifier: impl Into<RoleIdentifier>,
        strategy: Arc<dyn RoleStrategy>,
    ) -> Option<Arc<dyn RoleStrategy>> {
        self.engine.register_resolver(identifier, strategy)
    }

    pub async fn is_in_role(
        &self,
        role: impl Into<RoleIdentifier>,
        context: &RoleContext,
    ) -> Result<bool, ResolveError> {
        self.engine.is_in_role(&role.into(), context).await
    }

    pub async fn get_roles(&self, context: &RoleContext) -> Result<Vec<RoleIdentifier>, ResolveError> {
        self.engine.get_roles(context).await
    }

    pub async fn is_owner(
        &self,
        model_class: &str,
        model_id: impl Into<RecordId>,
        principal_id: impl Into<RecordId>,
    ) -> Result<bool, ResolveError> {
        self.acl.is_owner(model_class, model_id, principal_id).await
    }
}

impl Default for Rolegate {
    fn default() -> Self {
        Self::in_memory(RolegateConfig::default())
    }
}
