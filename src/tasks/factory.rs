//! # Worker factory.
//!
//! The registry never builds migration logic itself: it asks a [`WorkerFactory`] for
//! a [`WorkerRef`] per submitted task. Production code plugs in the real migrate
//! worker; tests substitute [`FnWorkerFactory`].

use std::sync::Arc;

use crate::tasks::{MigrateTask, WorkerRef};

/// Shared handle to a factory.
pub type WorkerFactoryRef = Arc<dyn WorkerFactory>;

/// Builds the execution logic for a task.
///
/// Must be side-effect free from the registry's perspective: it is called under the
/// registry lock, before the duplicate check.
pub trait WorkerFactory: Send + Sync + 'static {
    fn new_migrate_worker(&self, task: &MigrateTask) -> WorkerRef;
}

/// Closure-backed factory.
///
/// ## Example
/// ```rust
/// use migrate_runner::{FnWorkerFactory, MigrateTask, RunContext, WorkerError, WorkerFn, WorkerRef};
///
/// let factory = FnWorkerFactory::arc(|_task: &MigrateTask| -> WorkerRef {
///     WorkerFn::arc(|_ctx: RunContext| async { Ok::<_, WorkerError>(()) })
/// });
/// ```
pub struct FnWorkerFactory<F> {
    f: F,
}

impl<F> FnWorkerFactory<F>
where
    F: Fn(&MigrateTask) -> WorkerRef + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> WorkerFactory for FnWorkerFactory<F>
where
    F: Fn(&MigrateTask) -> WorkerRef + Send + Sync + 'static,
{
    fn new_migrate_worker(&self, task: &MigrateTask) -> WorkerRef {
        (self.f)(task)
    }
}
