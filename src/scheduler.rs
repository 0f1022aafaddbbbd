//! # Scheduler handle.
//!
//! The registry forwards a [`SchedulerRef`] to every runner it creates and never
//! calls it itself. A runner reports its terminal outcome through it exactly once.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SchedulerError;
use crate::tasks::Category;

/// Shared handle to a scheduler client.
pub type SchedulerRef = Arc<dyn SchedulerClient>;

/// Terminal outcome of a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Migration finished.
    Succeeded,
    /// Migration failed with the given reason.
    Failed { reason: String },
    /// Runner honored a stop request before finishing.
    Stopped,
}

/// Report sent by a runner when it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task_id: Arc<str>,
    pub category: Category,
    pub outcome: TaskOutcome,
}

/// Client of the upstream scheduler.
#[async_trait]
pub trait SchedulerClient: Send + Sync + 'static {
    /// Delivers a terminal report. Errors are logged by the runner and otherwise ignored.
    async fn report(&self, report: TaskReport) -> Result<(), SchedulerError>;
}

/// Scheduler client that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

#[async_trait]
impl SchedulerClient for NoopScheduler {
    async fn report(&self, _report: TaskReport) -> Result<(), SchedulerError> {
        Ok(())
    }
}
