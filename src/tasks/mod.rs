//! # Migration task abstractions.
//!
//! This module provides the task-related types:
//! - [`TaskType`] / [`Category`] - declared task type and the migration category it resolves to
//! - [`MigrateTask`] - task descriptor handed over by the scheduler
//! - [`MigrateWorker`] - trait for the execution logic a runner carries out
//! - [`WorkerFn`] - function-backed worker implementation
//! - [`WorkerFactory`] - builds a worker for a task

mod category;
mod factory;
mod task;
mod worker;

pub use category::{Category, TaskType};
pub use factory::{FnWorkerFactory, WorkerFactory, WorkerFactoryRef};
pub use task::MigrateTask;
pub use worker::{MigrateWorker, RunContext, WorkerFn, WorkerRef};
