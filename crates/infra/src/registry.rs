//! Role registry: role records and their principal relations.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use rolegate_auth::{
    Application, NewRole, NewRoleMapping, Principal, PrincipalType, Role, RoleMapping, User,
};
use rolegate_core::{Query, RecordId};

use crate::StoreError;
use crate::store::RecordStore;

pub struct RoleRegistry {
    roles: Arc<dyn RecordStore<Role>>,
    mappings: Arc<dyn RecordStore<RoleMapping>>,
    users: Arc<dyn RecordStore<User>>,
    applications: Arc<dyn RecordStore<Application>>,
}

impl RoleRegistry {
    pub fn new(
        roles: Arc<dyn RecordStore<Role>>,
        mappings: Arc<dyn RecordStore<RoleMapping>>,
        users: Arc<dyn RecordStore<User>>,
        applications: Arc<dyn RecordStore<Application>>,
    ) -> Self {
        Self {
            roles,
            mappings,
            users,
            applications,
        }
    }

    /// Create a role. Blank or duplicate names fail validation.
    #[instrument(level = "debug", skip_all)]
    pub async fn create(&self, role: impl Into<NewRole>) -> Result<Role, StoreError> {
        let role = self.roles.create(role.into()).await?;
        info!(role_id = %role.id, name = %role.name, "created role");
        Ok(role)
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<Role>, StoreError> {
        self.roles.find(query).await
    }

    pub async fn find_by_id(&self, id: &RecordId) -> Result<Option<Role>, StoreError> {
        self.roles.find_by_id(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        self.roles.find_one(&Query::new().eq("name", name)).await
    }

    /// Statically map a principal to `role_id`. Duplicates are recorded as-is.
    pub async fn assign(
        &self,
        role_id: &RecordId,
        principal_type: PrincipalType,
        principal_id: impl Into<RecordId>,
    ) -> Result<RoleMapping, StoreError> {
        let mapping = self
            .mappings
            .create(NewRoleMapping {
                role_id: role_id.clone(),
                principal_type,
                principal_id: principal_id.into(),
            })
            .await?;
        info!(
            role_id = %mapping.role_id,
            principal_type = %mapping.principal_type,
            principal_id = %mapping.principal_id,
            "assigned principal to role"
        );
        Ok(mapping)
    }

    /// Every mapping row of `role_id`, duplicates included.
    pub async fn principals(&self, role_id: &RecordId) -> Result<Vec<RoleMapping>, StoreError> {
        self.mappings
            .find(&Query::new().eq("roleId", role_id.to_json()))
            .await
    }

    /// Users mapped to `role_id`.
    pub async fn users(&self, role_id: &RecordId, refine: Option<Query>) -> Result<Vec<User>, StoreError> {
        self.mapped_principals(self.users.as_ref(), role_id, refine).await
    }

    /// Applications mapped to `role_id`.
    pub async fn applications(
        &self,
        role_id: &RecordId,
        refine: Option<Query>,
    ) -> Result<Vec<Application>, StoreError> {
        self.mapped_principals(self.applications.as_ref(), role_id, refine)
            .await
    }

    /// Roles mapped (as principals) to `role_id`.
    pub async fn roles(&self, role_id: &RecordId, refine: Option<Query>) -> Result<Vec<Role>, StoreError> {
        self.mapped_principals(self.roles.as_ref(), role_id, refine).await
    }

    /// Roles the principal is statically mapped to, in role-store order.
    pub async fn roles_of(
        &self,
        principal_type: PrincipalType,
        principal_id: &RecordId,
    ) -> Result<Vec<Role>, StoreError> {
        let rows = self
            .mappings
            .find(&RoleMapping::query_for_principal(principal_type, principal_id))
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids = rows.iter().map(|m| m.role_id.to_json());
        self.roles.find(&Query::new().any_of("id", ids)).await
    }

    /// Join the role's mapping rows of `P`'s type against `store`.
    ///
    /// The caller's refinement reaches `store` as given, with one extra
    /// condition restricting `id` to the mapped principal ids.
    async fn mapped_principals<P: Principal>(
        &self,
        store: &dyn RecordStore<P>,
        role_id: &RecordId,
        refine: Option<Query>,
    ) -> Result<Vec<P>, StoreError> {
        let rows = self
            .mappings
            .find(&RoleMapping::query_for_role(role_id, P::PRINCIPAL_TYPE))
            .await?;
        let ids: Vec<_> = rows.iter().map(|m| m.principal_id.to_json()).collect();
        debug!(%role_id, principal_type = %P::PRINCIPAL_TYPE, mapped = ids.len(), "joining principals");

        let query = refine.unwrap_or_default().any_of("id", ids);
        store.find(&query).await
    }
}
