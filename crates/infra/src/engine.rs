//! Role resolution engine: `is_in_role` and `get_roles`.
//!
//! Registered strategies win over static mappings. Everything else goes to
//! the mapping store, one discrete query per candidate role; no transaction
//! spans the queries of a single call.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use rolegate_auth::{
    AUTHENTICATED, EVERYONE, PrincipalType, Role, RoleContext, RoleIdentifier, RoleMapping,
    UNAUTHENTICATED,
};
use rolegate_core::{Query, RecordId};

use crate::config::RolegateConfig;
use crate::resolver::{ResolverRegistry, RoleStrategy};
use crate::store::RecordStore;
use crate::{ResolveError, StoreError};

pub struct RoleEngine {
    roles: Arc<dyn RecordStore<Role>>,
    mappings: Arc<dyn RecordStore<RoleMapping>>,
    resolvers: Arc<ResolverRegistry>,
    concurrency: usize,
}

impl RoleEngine {
    pub fn new(
        roles: Arc<dyn RecordStore<Role>>,
        mappings: Arc<dyn RecordStore<RoleMapping>>,
        resolvers: Arc<ResolverRegistry>,
        config: &RolegateConfig,
    ) -> Self {
        Self {
            roles,
            mappings,
            resolvers,
            concurrency: config.role_check_concurrency.max(1),
        }
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    /// Register (or replace) the strategy for `identifier`.
    pub fn register_resolver(
        &self,
        identifier: impl Into<RoleIdentifier>,
        strategy: Arc<dyn RoleStrategy>,
    ) -> Option<Arc<dyn RoleStrategy>> {
        self.resolvers.register(identifier, strategy)
    }

    /// Is the context's principal a member of `role`?
    ///
    /// Unknown roles resolve to `false`; only store and strategy failures are
    /// errors.
    #[instrument(level = "debug", skip(self, role, context), fields(role = %role, principal_type = %context.principal_type))]
    pub async fn is_in_role(&self, role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        if let Some(strategy) = self.resolvers.get(role) {
            let member = strategy.resolve(role, context).await?;
            debug!(member, "resolved by strategy");
            return Ok(member);
        }

        let Some(found) = self.find_role(role).await? else {
            debug!("unknown role");
            return Ok(false);
        };

        if is_self_reference(&found.id, context) {
            return Ok(true);
        }

        let member = self.has_mapping(&found.id, context).await?;
        debug!(role_id = %found.id, member, "resolved by mapping");
        Ok(member)
    }

    /// Every built-in and persisted role that applies to the context.
    ///
    /// Order: EVERYONE, AUTHENTICATED or UNAUTHENTICATED, the context's own role
    /// (ROLE principals), then mapped roles in role-store order. Custom
    /// strategies are not enumerated.
    #[instrument(level = "debug", skip(self, context), fields(principal_type = %context.principal_type))]
    pub async fn get_roles(&self, context: &RoleContext) -> Result<Vec<RoleIdentifier>, ResolveError> {
        let mut roles = vec![EVERYONE];
        if context.is_authenticated() {
            roles.push(AUTHENTICATED);
        } else {
            roles.push(UNAUTHENTICATED);
        }

        let Some(principal_id) = &context.principal_id else {
            return Ok(roles);
        };
        if context.principal_type == PrincipalType::Role {
            roles.push(RoleIdentifier::Id(principal_id.clone()));
        }

        let candidates = self.roles.find(&Query::new()).await?;
        let mapped: Vec<Option<RecordId>> = stream::iter(candidates)
            .map(|role| async move {
                let hit = self.has_mapping(&role.id, context).await?;
                Ok::<_, StoreError>(hit.then_some(role.id))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        for role_id in mapped.into_iter().flatten() {
            push_unique(&mut roles, role_id);
        }

        debug!(count = roles.len(), "collected roles");
        Ok(roles)
    }

    /// Resolve an identifier to a persisted role: ids by id, names by name
    /// first and then as an id.
    async fn find_role(&self, role: &RoleIdentifier) -> Result<Option<Role>, StoreError> {
        match role {
            RoleIdentifier::Builtin(_) => Ok(None),
            RoleIdentifier::Id(id) => self.roles.find_by_id(id).await,
            RoleIdentifier::Name(name) => {
                if let Some(found) = self.roles.find_one(&Query::new().eq("name", name.as_str())).await? {
                    return Ok(Some(found));
                }
                self.roles.find_by_id(&RecordId::from(name.as_str())).await
            }
        }
    }

    async fn has_mapping(&self, role_id: &RecordId, context: &RoleContext) -> Result<bool, StoreError> {
        let Some(principal_id) = &context.principal_id else {
            return Ok(false);
        };
        let query = RoleMapping::query_for(role_id, context.principal_type, principal_id);
        Ok(self.mappings.find_one(&query).await?.is_some())
    }
}

/// A ROLE principal is a member of itself (one level, no closure).
fn is_self_reference(role_id: &RecordId, context: &RoleContext) -> bool {
    context.principal_type == PrincipalType::Role
        && context
            .principal_id
            .as_ref()
            .is_some_and(|id| id.loosely_eq(role_id))
}

fn push_unique(roles: &mut Vec<RoleIdentifier>, role_id: RecordId) {
    let seen = roles.iter().any(|r| match r {
        RoleIdentifier::Id(existing) => existing.loosely_eq(&role_id),
        _ => false,
    });
    if !seen {
        roles.push(RoleIdentifier::Id(role_id));
    }
}
