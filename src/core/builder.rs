use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::registry::RunnerRegistry;
use crate::{
    config::Config,
    scheduler::{NoopScheduler, SchedulerRef},
    tasks::WorkerFactoryRef,
};

/// Builder for constructing a [`RunnerRegistry`].
pub struct RegistryBuilder {
    cfg: Config,
    factory: WorkerFactoryRef,
    scheduler: Option<SchedulerRef>,
    parent: Option<CancellationToken>,
}

impl RegistryBuilder {
    /// Creates a new builder with the given configuration and worker factory.
    pub fn new(cfg: Config, factory: WorkerFactoryRef) -> Self {
        Self {
            cfg,
            factory,
            scheduler: None,
            parent: None,
        }
    }

    /// Sets the scheduler handle forwarded to every runner.
    ///
    /// Defaults to [`NoopScheduler`].
    pub fn with_scheduler(mut self, scheduler: SchedulerRef) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Ties the registry to the owning service's lifetime: cancelling `parent`
    /// stops every runner.
    pub fn with_parent_token(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds and returns the registry.
    pub fn build(self) -> Arc<RunnerRegistry> {
        let root = match self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(NoopScheduler) as SchedulerRef);

        Arc::new(RunnerRegistry::new_internal(
            self.cfg,
            self.factory,
            scheduler,
            root,
        ))
    }
}

impl RunnerRegistry {
    /// Creates a registry with an explicit scheduler handle.
    pub fn new(cfg: Config, scheduler: SchedulerRef, factory: WorkerFactoryRef) -> Arc<Self> {
        RegistryBuilder::new(cfg, factory)
            .with_scheduler(scheduler)
            .build()
    }

    /// Returns a builder.
    pub fn builder(cfg: Config, factory: WorkerFactoryRef) -> RegistryBuilder {
        RegistryBuilder::new(cfg, factory)
    }
}
