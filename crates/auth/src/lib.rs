//! `rolegate-auth`: pure role/principal domain model.
//!
//! This crate is intentionally decoupled from storage: it defines what roles,
//! mappings, principals and resolution contexts are, not how they are found.

pub mod context;
pub mod principal;
pub mod roles;

pub use context::RoleContext;
pub use principal::{
    APPLICATION, Application, NewApplication, NewUser, Principal, PrincipalType, ROLE,
    ResolvedPrincipal, USER, UnknownPrincipalType, User,
};
pub use roles::{
    AUTHENTICATED, BuiltinRole, EVERYONE, NewRole, NewRoleMapping, OWNER, Role, RoleIdentifier,
    RoleMapping, UNAUTHENTICATED,
};
