//! Role strategies and the adapters that normalize authoring styles.
//!
//! A strategy can answer directly, answer later through a completion handle,
//! or return a future. All three end up behind [`RoleStrategy`], so the engine
//! awaits every strategy the same way.

use std::future::Future;

use tokio::sync::oneshot;

use rolegate_auth::{RoleContext, RoleIdentifier};

use crate::ResolveError;

/// Asynchronous membership predicate for one role identifier.
#[async_trait::async_trait]
pub trait RoleStrategy: Send + Sync {
    async fn resolve(&self, role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError>;
}

fn strategy_failed(role: &RoleIdentifier, cause: anyhow::Error) -> ResolveError {
    tracing::warn!(role = %role, error = %cause, "role strategy failed");
    ResolveError::Strategy {
        role: role.to_string(),
        cause,
    }
}

/// Strategy that answers synchronously.
pub struct DirectStrategy<F> {
    f: F,
}

impl<F> DirectStrategy<F>
where
    F: Fn(&RoleIdentifier, &RoleContext) -> anyhow::Result<bool> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> RoleStrategy for DirectStrategy<F>
where
    F: Fn(&RoleIdentifier, &RoleContext) -> anyhow::Result<bool> + Send + Sync,
{
    async fn resolve(&self, role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        (self.f)(role, context).map_err(|e| strategy_failed(role, e))
    }
}

/// Strategy that returns a future (deferred completion).
pub struct DeferredStrategy<F> {
    f: F,
}

impl<F, Fut> DeferredStrategy<F>
where
    F: Fn(RoleIdentifier, RoleContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F, Fut> RoleStrategy for DeferredStrategy<F>
where
    F: Fn(RoleIdentifier, RoleContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    async fn resolve(&self, role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        (self.f)(role.clone(), context.clone())
            .await
            .map_err(|e| strategy_failed(role, e))
    }
}

/// One-shot handle a callback-style strategy uses to deliver its answer.
///
/// Dropping it without calling [`Completion::complete`] fails the resolution.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<anyhow::Result<bool>>,
}

impl Completion {
    pub fn complete(self, result: anyhow::Result<bool>) {
        // The receiver is gone only if the caller stopped waiting.
        let _ = self.tx.send(result);
    }

    pub fn yes(self) {
        self.complete(Ok(true));
    }

    pub fn no(self) {
        self.complete(Ok(false));
    }
}

/// Strategy that answers through a [`Completion`] handle (callback completion).
pub struct CallbackStrategy<F> {
    f: F,
}

impl<F> CallbackStrategy<F>
where
    F: Fn(RoleIdentifier, RoleContext, Completion) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F> RoleStrategy for CallbackStrategy<F>
where
    F: Fn(RoleIdentifier, RoleContext, Completion) + Send + Sync,
{
    async fn resolve(&self, role: &RoleIdentifier, context: &RoleContext) -> Result<bool, ResolveError> {
        let (tx, rx) = oneshot::channel();
        (self.f)(role.clone(), context.clone(), Completion { tx });
        match rx.await {
            Ok(result) => result.map_err(|e| strategy_failed(role, e)),
            Err(_) => Err(ResolveError::Abandoned(role.to_string())),
        }
    }
}
