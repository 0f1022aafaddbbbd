//! Error types used by the runner registry and migration workers.
//!
//! This module defines the error enums:
//!
//! - [`RegistryError`] — synchronous failures of registry operations (`submit`, `stop_task`).
//! - [`WorkerError`] — errors raised by a worker while executing a migration task.
//! - [`RuntimeError`] — failures of the registry shutdown sequence.
//! - [`SchedulerError`] — failures reported by a scheduler client.
//!
//! Each type provides an `as_label` helper returning a stable snake_case label for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::tasks::{Category, TaskType};

/// # Errors returned by registry operations.
///
/// All of them are returned synchronously by the call that detected them and leave
/// the registry unchanged.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A non-stopped runner already occupies this task id in the category.
    #[error("running task add again: category={category} task_id={task_id}")]
    DuplicateActiveTask {
        /// Category the task was submitted into.
        category: Category,
        /// Conflicting task id.
        task_id: String,
    },

    /// No runner with this task id exists in the category.
    #[error("no such task: category={category} task_id={task_id}")]
    TaskNotFound {
        /// Category that was searched.
        category: Category,
        /// Requested task id.
        task_id: String,
    },

    /// The declared task type is not one of the migration categories.
    #[error("unsupported task type: {task_type}")]
    UnsupportedTaskType {
        /// Declared task type.
        task_type: TaskType,
    },

    /// The registry has been shut down and accepts no new tasks.
    #[error("registry is closed")]
    Closed,
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use migrate_runner::{Category, RegistryError};
    ///
    /// let err = RegistryError::TaskNotFound { category: Category::Repair, task_id: "t1".into() };
    /// assert_eq!(err.as_label(), "task_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateActiveTask { .. } => "duplicate_active_task",
            RegistryError::TaskNotFound { .. } => "task_not_found",
            RegistryError::UnsupportedTaskType { .. } => "unsupported_task_type",
            RegistryError::Closed => "registry_closed",
        }
    }
}

/// # Errors produced by a migration worker.
///
/// The registry never sees these: the runner maps them onto its terminal state
/// and reports them to the scheduler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Migration failed; the scheduler may hand the task out again.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error (source data lost, destination rejected, ...).
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Worker observed cancellation and exited early.
    #[error("context cancelled")]
    Canceled,
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Fatal { .. } => "worker_fatal",
            WorkerError::Canceled => "worker_canceled",
        }
    }

    /// Shorthand for [`WorkerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        WorkerError::Fail { error: error.into() }
    }
}

/// # Errors produced by the registry shutdown sequence.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some runners did not reach a terminal state.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of runners that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Error reported by a [`SchedulerClient`](crate::SchedulerClient) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("scheduler: {0}")]
pub struct SchedulerError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_labels() {
        let dup = RegistryError::DuplicateActiveTask {
            category: Category::Balance,
            task_id: "b-1".into(),
        };
        assert_eq!(dup.as_label(), "duplicate_active_task");
        assert_eq!(
            dup.to_string(),
            "running task add again: category=balance task_id=b-1"
        );

        let unsupported = RegistryError::UnsupportedTaskType {
            task_type: TaskType::ShardRepair,
        };
        assert_eq!(unsupported.as_label(), "unsupported_task_type");
        assert_eq!(unsupported.to_string(), "unsupported task type: shard_repair");
        assert_eq!(RegistryError::Closed.as_label(), "registry_closed");
    }

    #[test]
    fn test_worker_labels() {
        assert_eq!(WorkerError::fail("io").as_label(), "worker_failed");
        assert_eq!(WorkerError::fail("io").to_string(), "execution failed: io");
        assert_eq!(WorkerError::Canceled.as_label(), "worker_canceled");
        assert_eq!(
            WorkerError::Fatal { error: "gone".into() }.as_label(),
            "worker_fatal"
        );
    }

    #[test]
    fn test_grace_exceeded_message() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec!["t1".into()],
        };
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
        assert!(err.to_string().contains("t1"));
    }
}
