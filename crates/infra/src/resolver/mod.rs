//! Resolver registry: pluggable, context-computed role membership.

pub mod builtin;
pub mod registry;
pub mod strategy;

pub use builtin::{AuthenticatedStrategy, EveryoneStrategy, OwnerStrategy, UnauthenticatedStrategy};
pub use registry::ResolverRegistry;
pub use strategy::{CallbackStrategy, Completion, DeferredStrategy, DirectStrategy, RoleStrategy};
