//! Access facade: principal references in, membership answers out.

use std::sync::Arc;

use tracing::debug;

use rolegate_auth::{OWNER, PrincipalType, ResolvedPrincipal, RoleContext, RoleIdentifier, USER};
use rolegate_core::RecordId;

use crate::directory::PrincipalDirectory;
use crate::engine::RoleEngine;
use crate::{ResolveError, StoreError};

pub struct Acl {
    directory: Arc<PrincipalDirectory>,
    engine: Arc<RoleEngine>,
}

impl Acl {
    pub fn new(directory: Arc<PrincipalDirectory>, engine: Arc<RoleEngine>) -> Self {
        Self { directory, engine }
    }

    pub async fn resolve_principal(
        &self,
        principal_type: PrincipalType,
        key: impl Into<RecordId>,
    ) -> Result<Option<ResolvedPrincipal>, StoreError> {
        self.directory.resolve(principal_type, &key.into()).await
    }

    /// Whether the principal named by `key` (id, username, email or name) is
    /// in `role`. Unresolvable keys answer `false`.
    pub async fn is_mapped_to_role(
        &self,
        principal_type: PrincipalType,
        key: impl Into<RecordId>,
        role: impl Into<RoleIdentifier>,
    ) -> Result<bool, ResolveError> {
        let key = key.into();
        let Some(principal) = self.directory.resolve(principal_type, &key).await? else {
            debug!(%principal_type, %key, "principal not resolved");
            return Ok(false);
        };
        let context = RoleContext::principal(principal_type, principal.id().clone());
        self.engine.is_in_role(&role.into(), &context).await
    }

    /// Whether user `principal_id` owns `model_class#model_id`.
    pub async fn is_owner(
        &self,
        model_class: &str,
        model_id: impl Into<RecordId>,
        principal_id: impl Into<RecordId>,
    ) -> Result<bool, ResolveError> {
        let context = RoleContext::principal(USER, principal_id).with_model(model_class, model_id);
        self.engine.is_in_role(&OWNER, &context).await
    }
}
