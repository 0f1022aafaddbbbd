//! # Migration worker abstraction and function-backed implementation.
//!
//! This module defines the [`MigrateWorker`] trait (async, cancelable) and a convenient
//! function-backed implementation [`WorkerFn`]. The common handle type is [`WorkerRef`],
//! an `Arc<dyn MigrateWorker>` shared between the factory and the runner.
//!
//! A worker receives a [`RunContext`] and should periodically check its cancellation
//! token to honor a cooperative stop request.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::tasks::Category;

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn MigrateWorker>;

/// Everything a worker gets from its runner for one execution.
///
/// `limiter` has one permit per unit of the category concurrency quota;
/// workers acquire a permit per simultaneous work item (shard, chunk, ...).
#[derive(Clone, Debug)]
pub struct RunContext {
    task_id: Arc<str>,
    category: Category,
    source_idc: Arc<str>,
    concurrency: usize,
    limiter: Arc<Semaphore>,
    token: CancellationToken,
}

impl RunContext {
    pub(crate) fn new(
        task_id: Arc<str>,
        category: Category,
        source_idc: Arc<str>,
        concurrency: usize,
        token: CancellationToken,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            task_id,
            category,
            source_idc,
            concurrency,
            limiter: Arc::new(Semaphore::new(concurrency)),
            token,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn source_idc(&self) -> &str {
        &self.source_idc
    }

    /// Concurrency quota handed to this runner (at least 1).
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Cancellation token of the owning runner.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Acquires one work-item permit, or fails with [`WorkerError::Canceled`]
    /// if the runner is stopped while waiting.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, WorkerError> {
        let permit = self.limiter.clone().acquire_owned();
        tokio::pin!(permit);

        tokio::select! {
            res = &mut permit => res.map_err(|_closed| WorkerError::Canceled),
            _ = self.token.cancelled() => Err(WorkerError::Canceled),
        }
    }
}

/// # Execution logic of one migration task.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use migrate_runner::{MigrateWorker, RunContext, WorkerError};
///
/// struct Noop;
///
/// #[async_trait]
/// impl MigrateWorker for Noop {
///     async fn run(&self, ctx: RunContext) -> Result<(), WorkerError> {
///         if ctx.is_cancelled() {
///             return Err(WorkerError::Canceled);
///         }
///         // migrate shards...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MigrateWorker: Send + Sync + 'static {
    /// Runs the migration until completion or cancellation.
    ///
    /// Implementations should return `Err(WorkerError::Canceled)` when they notice
    /// `ctx.is_cancelled()`.
    async fn run(&self, ctx: RunContext) -> Result<(), WorkerError>;
}

/// Function-backed worker.
///
/// Wraps a closure that *creates* a new future per run.
#[derive(Debug)]
pub struct WorkerFn<F> {
    f: F,
}

impl<F> WorkerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the worker and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use migrate_runner::{RunContext, WorkerError, WorkerFn, WorkerRef};
    ///
    /// let w: WorkerRef = WorkerFn::arc(|_ctx: RunContext| async { Ok::<_, WorkerError>(()) });
    /// ```
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> MigrateWorker for WorkerFn<F>
where
    F: Fn(RunContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    async fn run(&self, ctx: RunContext) -> Result<(), WorkerError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(concurrency: usize) -> RunContext {
        RunContext::new(
            "t1".into(),
            Category::Repair,
            "z0".into(),
            concurrency,
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_zero_quota_clamped() {
        assert_eq!(ctx(0).concurrency(), 1);
        assert_eq!(ctx(4).concurrency(), 4);
    }

    #[tokio::test]
    async fn test_acquire_respects_quota() {
        let ctx = ctx(2);
        let a = ctx.acquire().await.unwrap();
        let _b = ctx.acquire().await.unwrap();
        assert_eq!(ctx.limiter.available_permits(), 0);
        drop(a);
        assert_eq!(ctx.limiter.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_acquire_cancelled_while_waiting() {
        let ctx = ctx(1);
        let _held = ctx.acquire().await.unwrap();

        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.acquire().await.map(|_| ()) });
        ctx.token().cancel();

        assert_eq!(handle.await.unwrap(), Err(WorkerError::Canceled));
    }

    #[tokio::test]
    async fn test_worker_fn_runs_closure() {
        let w: WorkerRef = WorkerFn::arc(|ctx: RunContext| async move {
            if ctx.task_id() == "t1" {
                Ok(())
            } else {
                Err(WorkerError::fail("wrong task"))
            }
        });
        assert_eq!(w.run(ctx(1)).await, Ok(()));
    }
}
