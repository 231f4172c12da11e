//! Principal directory: principal references to principal records.

use std::sync::Arc;

use tracing::debug;

use rolegate_auth::{Application, Principal, PrincipalType, ResolvedPrincipal, Role, User};
use rolegate_core::{Query, RecordId};

use crate::StoreError;
use crate::store::RecordStore;

pub struct PrincipalDirectory {
    users: Arc<dyn RecordStore<User>>,
    applications: Arc<dyn RecordStore<Application>>,
    roles: Arc<dyn RecordStore<Role>>,
}

impl PrincipalDirectory {
    pub fn new(
        users: Arc<dyn RecordStore<User>>,
        applications: Arc<dyn RecordStore<Application>>,
        roles: Arc<dyn RecordStore<Role>>,
    ) -> Self {
        Self {
            users,
            applications,
            roles,
        }
    }

    /// Resolve `key` as a primary id, then as each alternate unique attribute
    /// of the principal type. First match wins.
    pub async fn resolve(
        &self,
        principal_type: PrincipalType,
        key: &RecordId,
    ) -> Result<Option<ResolvedPrincipal>, StoreError> {
        let resolved: Option<ResolvedPrincipal> = match principal_type {
            PrincipalType::User => resolve_in(self.users.as_ref(), key).await?.map(Into::into),
            PrincipalType::Application => resolve_in(self.applications.as_ref(), key)
                .await?
                .map(Into::into),
            PrincipalType::Role => resolve_in(self.roles.as_ref(), key).await?.map(Into::into),
        };
        debug!(%principal_type, %key, found = resolved.is_some(), "resolved principal");
        Ok(resolved)
    }
}

async fn resolve_in<P: Principal>(store: &dyn RecordStore<P>, key: &RecordId) -> Result<Option<P>, StoreError> {
    if let Some(found) = store.find_by_id(key).await? {
        return Ok(Some(found));
    }
    for field in P::alternate_keys() {
        let query = Query::new().eq(*field, key.to_json());
        if let Some(found) = store.find_one(&query).await? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
