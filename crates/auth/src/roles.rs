use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use rolegate_core::{Entity, PRESENCE, Query, RecordId, ValidationError};

use crate::{Principal, PrincipalType};

/// Persisted role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified: DateTime<Utc>,
}

/// Attributes for registering a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

impl NewRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<&str> for NewRole {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NewRole {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Entity for Role {
    type Draft = NewRole;
    const MODEL: &'static str = "Role";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewRole) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: draft.name,
            description: draft.description,
            created: now,
            modified: now,
        }
    }

    fn unique_fields() -> &'static [&'static str] {
        &["name"]
    }

    fn required_fields() -> &'static [&'static str] {
        &["created", "modified"]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(Self::MODEL);
        if self.name.trim().is_empty() {
            err.add("name", PRESENCE, "can't be blank");
        }
        err.into_result()
    }
}

impl Principal for Role {
    const PRINCIPAL_TYPE: PrincipalType = PrincipalType::Role;

    fn alternate_keys() -> &'static [&'static str] {
        &["name"]
    }
}

/// Static assignment of one principal to one role.
///
/// No uniqueness is enforced: the same pair may be recorded more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMapping {
    pub id: RecordId,
    pub role_id: RecordId,
    pub principal_type: PrincipalType,
    pub principal_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoleMapping {
    pub role_id: RecordId,
    pub principal_type: PrincipalType,
    pub principal_id: RecordId,
}

impl RoleMapping {
    /// Rows of `role_id` held by principals of `principal_type`.
    pub fn query_for_role(role_id: &RecordId, principal_type: PrincipalType) -> Query {
        Query::new()
            .eq("roleId", role_id.to_json())
            .eq("principalType", principal_type.as_str())
    }

    /// Rows assigning the principal `(principal_type, principal_id)`.
    pub fn query_for_principal(principal_type: PrincipalType, principal_id: &RecordId) -> Query {
        Query::new()
            .eq("principalType", principal_type.as_str())
            .eq("principalId", principal_id.to_json())
    }

    /// Rows assigning the principal to `role_id`.
    pub fn query_for(role_id: &RecordId, principal_type: PrincipalType, principal_id: &RecordId) -> Query {
        Self::query_for_role(role_id, principal_type).eq("principalId", principal_id.to_json())
    }
}

impl Entity for RoleMapping {
    type Draft = NewRoleMapping;
    const MODEL: &'static str = "RoleMapping";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewRoleMapping) -> Self {
        Self {
            id,
            role_id: draft.role_id,
            principal_type: draft.principal_type,
            principal_id: draft.principal_id,
        }
    }

    fn required_fields() -> &'static [&'static str] {
        &["roleId", "principalType", "principalId"]
    }
}

/// Roles with built-in, context-computed membership.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinRole {
    Everyone,
    Authenticated,
    Unauthenticated,
    Owner,
}

impl BuiltinRole {
    pub const ALL: [BuiltinRole; 4] = [
        BuiltinRole::Everyone,
        BuiltinRole::Authenticated,
        BuiltinRole::Unauthenticated,
        BuiltinRole::Owner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinRole::Everyone => "$everyone",
            BuiltinRole::Authenticated => "$authenticated",
            BuiltinRole::Unauthenticated => "$unauthenticated",
            BuiltinRole::Owner => "$owner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == s)
    }
}

/// Identifier used to ask about a role: a built-in, a role id or a role name.
///
/// Custom strategies are registered under `Name` (or `Id`) identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleIdentifier {
    Builtin(BuiltinRole),
    Id(RecordId),
    Name(String),
}

pub const EVERYONE: RoleIdentifier = RoleIdentifier::Builtin(BuiltinRole::Everyone);
pub const AUTHENTICATED: RoleIdentifier = RoleIdentifier::Builtin(BuiltinRole::Authenticated);
pub const UNAUTHENTICATED: RoleIdentifier = RoleIdentifier::Builtin(BuiltinRole::Unauthenticated);
pub const OWNER: RoleIdentifier = RoleIdentifier::Builtin(BuiltinRole::Owner);

impl RoleIdentifier {
    pub fn as_builtin(&self) -> Option<BuiltinRole> {
        match self {
            RoleIdentifier::Builtin(b) => Some(*b),
            _ => None,
        }
    }
}

impl core::fmt::Display for RoleIdentifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RoleIdentifier::Builtin(b) => f.write_str(b.as_str()),
            RoleIdentifier::Id(id) => core::fmt::Display::fmt(id, f),
            RoleIdentifier::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for RoleIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RoleIdentifier::Builtin(b) => serializer.serialize_str(b.as_str()),
            RoleIdentifier::Id(id) => id.serialize(serializer),
            RoleIdentifier::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl From<&str> for RoleIdentifier {
    fn from(value: &str) -> Self {
        BuiltinRole::parse(value)
            .map(RoleIdentifier::Builtin)
            .unwrap_or_else(|| RoleIdentifier::Name(value.to_string()))
    }
}

impl From<String> for RoleIdentifier {
    fn from(value: String) -> Self {
        match BuiltinRole::parse(&value) {
            Some(b) => RoleIdentifier::Builtin(b),
            None => RoleIdentifier::Name(value),
        }
    }
}

impl From<BuiltinRole> for RoleIdentifier {
    fn from(value: BuiltinRole) -> Self {
        RoleIdentifier::Builtin(value)
    }
}

impl From<RecordId> for RoleIdentifier {
    fn from(value: RecordId) -> Self {
        RoleIdentifier::Id(value)
    }
}

impl From<&RecordId> for RoleIdentifier {
    fn from(value: &RecordId) -> Self {
        RoleIdentifier::Id(value.clone())
    }
}

impl From<&Role> for RoleIdentifier {
    fn from(value: &Role) -> Self {
        RoleIdentifier::Id(value.id.clone())
    }
}
