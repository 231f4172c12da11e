use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rolegate_core::{Entity, PRESENCE, RecordId, ValidationError};

use crate::Role;

/// Kind of entity that can hold role membership.
///
/// Closed set: every per-type lookup (typed relations, ownership scans,
/// principal resolution) matches on it exhaustively.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrincipalType {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "APP")]
    Application,
    #[serde(rename = "ROLE")]
    Role,
}

pub const USER: PrincipalType = PrincipalType::User;
pub const APPLICATION: PrincipalType = PrincipalType::Application;
pub const ROLE: PrincipalType = PrincipalType::Role;

impl PrincipalType {
    pub const ALL: [PrincipalType; 3] = [USER, APPLICATION, ROLE];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "USER",
            PrincipalType::Application => "APP",
            PrincipalType::Role => "ROLE",
        }
    }

    /// Name of the model backing this principal type.
    pub fn model(&self) -> &'static str {
        match self {
            PrincipalType::User => User::MODEL,
            PrincipalType::Application => Application::MODEL,
            PrincipalType::Role => Role::MODEL,
        }
    }

    /// Whether a present principal id of this type counts as authenticated.
    pub fn authenticates(&self) -> bool {
        matches!(self, PrincipalType::User | PrincipalType::Application)
    }
}

impl core::fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown principal type '{0}'")]
pub struct UnknownPrincipalType(pub String);

impl FromStr for PrincipalType {
    type Err = UnknownPrincipalType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(USER),
            "APP" | "APPLICATION" => Ok(APPLICATION),
            "ROLE" => Ok(ROLE),
            other => Err(UnknownPrincipalType(other.to_string())),
        }
    }
}

/// A record kind that can be referenced as a principal.
pub trait Principal: Entity {
    const PRINCIPAL_TYPE: PrincipalType;

    /// Alternate unique attributes, in lookup priority order.
    fn alternate_keys() -> &'static [&'static str];
}

/// Human user identity. Credentials are out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl NewUser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Entity for User {
    type Draft = NewUser;
    const MODEL: &'static str = "User";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewUser) -> Self {
        Self {
            id,
            username: draft.username,
            email: draft.email.map(|e| e.trim().to_lowercase()),
            name: draft.name,
        }
    }

    fn unique_fields() -> &'static [&'static str] {
        &["username", "email"]
    }
}

impl Principal for User {
    const PRINCIPAL_TYPE: PrincipalType = PrincipalType::User;

    fn alternate_keys() -> &'static [&'static str] {
        &["username", "email"]
    }
}

/// Application / service credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub description: Option<String>,
}

impl NewApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl Entity for Application {
    type Draft = NewApplication;
    const MODEL: &'static str = "Application";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewApplication) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            description: draft.description,
        }
    }

    fn unique_fields() -> &'static [&'static str] {
        &["name"]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(Self::MODEL);
        if self.name.is_empty() {
            err.add("name", PRESENCE, "can't be blank");
        }
        err.into_result()
    }
}

impl Principal for Application {
    const PRINCIPAL_TYPE: PrincipalType = PrincipalType::Application;

    fn alternate_keys() -> &'static [&'static str] {
        &["name"]
    }
}

/// A principal record resolved from a reference, of any principal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedPrincipal {
    User(User),
    Application(Application),
    Role(Role),
}

impl ResolvedPrincipal {
    pub fn id(&self) -> &RecordId {
        match self {
            ResolvedPrincipal::User(u) => &u.id,
            ResolvedPrincipal::Application(a) => &a.id,
            ResolvedPrincipal::Role(r) => &r.id,
        }
    }

    pub fn principal_type(&self) -> PrincipalType {
        match self {
            ResolvedPrincipal::User(_) => USER,
            ResolvedPrincipal::Application(_) => APPLICATION,
            ResolvedPrincipal::Role(_) => ROLE,
        }
    }
}

impl From<User> for ResolvedPrincipal {
    fn from(value: User) -> Self {
        Self::User(value)
    }
}

impl From<Application> for ResolvedPrincipal {
    fn from(value: Application) -> Self {
        Self::Application(value)
    }
}

impl From<Role> for ResolvedPrincipal {
    fn from(value: Role) -> Self {
        Self::Role(value)
    }
}
