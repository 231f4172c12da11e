use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use tracing::info;

use rolegate_auth::{AUTHENTICATED, EVERYONE, OWNER, RoleContext, RoleIdentifier, UNAUTHENTICATED};

use super::builtin::{AuthenticatedStrategy, EveryoneStrategy, OwnerStrategy, UnauthenticatedStrategy};
use super::strategy::{CallbackStrategy, Completion, DeferredStrategy, DirectStrategy, RoleStrategy};
use crate::model::ModelRegistry;
use crate::store::EntityStore;

/// Role identifier → strategy table.
///
/// Owned by a [`crate::RoleEngine`]; each engine (test fixture, tenant) has its
/// own. Registration swaps whole `Arc` entries, so a concurrent reader sees
/// either the old or the new strategy.
#[derive(Default)]
pub struct ResolverRegistry {
    strategies: RwLock<HashMap<RoleIdentifier, Arc<dyn RoleStrategy>>>,
}

impl ResolverRegistry {
    /// Empty registry (no built-ins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with EVERYONE, AUTHENTICATED, UNAUTHENTICATED and OWNER.
    pub fn with_builtins(entities: Arc<dyn EntityStore>, models: Arc<ModelRegistry>) -> Self {
        let registry = Self::new();
        registry.register(EVERYONE, Arc::new(EveryoneStrategy));
        registry.register(AUTHENTICATED, Arc::new(AuthenticatedStrategy));
        registry.register(UNAUTHENTICATED, Arc::new(UnauthenticatedStrategy));
        registry.register(OWNER, Arc::new(OwnerStrategy::new(entities, models)));
        registry
    }

    /// Store `strategy` under `identifier`, returning the one it replaces.
    pub fn register(
        &self,
        identifier: impl Into<RoleIdentifier>,
        strategy: Arc<dyn RoleStrategy>,
    ) -> Option<Arc<dyn RoleStrategy>> {
        let identifier = identifier.into();
        let mut strategies = self.strategies.write().unwrap_or_else(|e| e.into_inner());
        let previous = strategies.insert(identifier.clone(), strategy);
        info!(role = %identifier, replaced = previous.is_some(), "registered role strategy");
        previous
    }

    /// Register a strategy that answers synchronously.
    pub fn register_fn<F>(&self, identifier: impl Into<RoleIdentifier>, f: F) -> Option<Arc<dyn RoleStrategy>>
    where
        F: Fn(&RoleIdentifier, &RoleContext) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.register(identifier, Arc::new(DirectStrategy::new(f)))
    }

    /// Register a strategy that returns a future.
    pub fn register_async<F, Fut>(&self, identifier: impl Into<RoleIdentifier>, f: F) -> Option<Arc<dyn RoleStrategy>>
    where
        F: Fn(RoleIdentifier, RoleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.register(identifier, Arc::new(DeferredStrategy::new(f)))
    }

    /// Register a strategy that answers through a completion handle.
    pub fn register_callback<F>(&self, identifier: impl Into<RoleIdentifier>, f: F) -> Option<Arc<dyn RoleStrategy>>
    where
        F: Fn(RoleIdentifier, RoleContext, Completion) + Send + Sync + 'static,
    {
        self.register(identifier, Arc::new(CallbackStrategy::new(f)))
    }

    pub fn get(&self, identifier: &RoleIdentifier) -> Option<Arc<dyn RoleStrategy>> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.get(identifier).cloned()
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<RoleIdentifier> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<_> = strategies.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl core::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
