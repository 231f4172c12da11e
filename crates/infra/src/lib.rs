//! Infrastructure layer: stores, resolvers, the role engine and its facades.

pub mod acl;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod gate;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use acl::Acl;
pub use config::{ConfigError, IdStrategy, RolegateConfig};
pub use directory::PrincipalDirectory;
pub use engine::RoleEngine;
pub use error::{ResolveError, StoreError};
pub use gate::{Rolegate, Stores};
pub use model::{ModelDefinition, ModelRegistry, RelationDefinition, RelationKind};
pub use registry::RoleRegistry;
pub use resolver::{Completion, ResolverRegistry, RoleStrategy};
