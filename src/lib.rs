//! # migrate-runner
//!
//! **migrate-runner** is the runner registry of a storage node's data-migration
//! subsystem. It accepts migration tasks (disk repair, balance, disk-drop
//! evacuation, manual migration), keeps them in four independent category tables,
//! launches one asynchronous [`TaskRunner`] per task and lets the owning service
//! enumerate, stop and account for in-flight tasks.
//!
//! ## Architecture
//! ```text
//!   scheduler ──► MigrateTask ──► RunnerRegistry::submit()
//!                                      │
//!                                      ├─► Category::try_from(task_type)
//!                                      ├─► WorkerFactory::new_migrate_worker(task)
//!                                      ├─► TaskRunner::new(child token, quota, scheduler handle)
//!                                      └─► insert into category table, spawn runner.run()
//!
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ RunnerRegistry                                                    │
//! │   Mutex<{ repair, balance, disk_drop, manual_migrate }>           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │TaskRunner│       │TaskRunner│       │TaskRunner│  (independent tokio tasks)
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ MigrateWorker::run(RunContext)      │
//!        └─► SchedulerClient::report(outcome) ─┘
//!
//! owning poller:
//!   alive_tasks()     → { category → [task ids] }
//!   stop_task()       → cooperative stop, returns immediately
//!   stop_all_alive()  → stop every alive runner
//!   running_counts()  → compact stopped entries, return per-category sizes
//! ```
//!
//! ## Features
//! | Area              | Description                                             | Key types / traits                          |
//! |-------------------|---------------------------------------------------------|---------------------------------------------|
//! | **Registry**      | Per-category runner tables, submit/stop/enumerate/count | [`RunnerRegistry`], [`RunningCounts`]       |
//! | **Runners**       | One-shot execution with cooperative stop                | [`TaskRunner`], [`RunnerState`]             |
//! | **Workers**       | Pluggable migration logic                               | [`MigrateWorker`], [`WorkerFn`], [`WorkerFactory`] |
//! | **Scheduler**     | Terminal outcome reporting                              | [`SchedulerClient`], [`TaskReport`]         |
//! | **Events**        | Lifecycle broadcast for observers                       | [`Event`], [`EventKind`]                    |
//! | **Errors**        | Typed errors                                            | [`RegistryError`], [`WorkerError`], [`RuntimeError`] |
//! | **Configuration** | Per-category quotas, bus capacity, grace                | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports [`logger::logger_init`] to install a `tracing-subscriber`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use migrate_runner::{
//!     Config, FnWorkerFactory, MigrateTask, RunContext, RunnerRegistry, TaskType, WorkerError,
//!     WorkerFn, WorkerRef,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = FnWorkerFactory::arc(|_task: &MigrateTask| -> WorkerRef {
//!         WorkerFn::arc(|ctx: RunContext| async move {
//!             let _permit = ctx.acquire().await?;
//!             // move one shard...
//!             Ok::<(), WorkerError>(())
//!         })
//!     });
//!
//!     let registry = RunnerRegistry::builder(Config::default(), factory).build();
//!     registry
//!         .submit(MigrateTask::new("repair-1", TaskType::DiskRepair, "z0"))
//!         .await?;
//!
//!     registry.shutdown(Duration::from_secs(5)).await?;
//!     assert_eq!(registry.running_counts().await.total(), 0);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod scheduler;
mod tasks;

#[cfg(feature = "logging")]
pub mod logger;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{RegistryBuilder, RunnerRegistry, RunnerState, RunningCounts, TaskRunner};
pub use error::{RegistryError, RuntimeError, SchedulerError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use scheduler::{NoopScheduler, SchedulerClient, SchedulerRef, TaskOutcome, TaskReport};
pub use tasks::{
    Category, FnWorkerFactory, MigrateTask, MigrateWorker, RunContext, TaskType, WorkerFactory,
    WorkerFactoryRef, WorkerFn, WorkerRef,
};
