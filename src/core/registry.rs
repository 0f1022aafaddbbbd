//! # Runner registry - per-category bookkeeping of migration runners.
//!
//! The registry accepts migration tasks, keeps one [`TaskRunner`] per task id in the
//! table of the task's [`Category`], and launches every accepted runner as an
//! independent tokio task. The owning service polls it for liveness and counts and
//! sends cooperative stop requests through it.
//!
//! ## Architecture
//! ```text
//! submit(task) ──► Category::try_from(task_type) ──► factory.new_migrate_worker(task)
//!                         │                                   │
//!                         ▼                                   ▼
//!                  quota = cfg.concurrency(c)     TaskRunner::new(root.child_token(), ..)
//!                                                             │
//!      Mutex<CategoryTables> ◄── add_runner (reject non-stopped duplicate)
//!        ├─ repair                                            │
//!        ├─ balance                                           ▼
//!        ├─ disk_drop                          tracker.spawn(runner.run())  (fire-and-forget)
//!        └─ manual_migrate
//!
//! alive_tasks()     ──► snapshot of ids whose runner is alive (empty categories omitted)
//! stop_task()       ──► runner.stop() (signal only, entry stays)
//! stop_all_alive()  ──► runner.stop() for every alive runner
//! running_counts()  ──► drop stopped entries, return table sizes
//! ```
//!
//! ## Rules
//! - One lock guards all four tables; every structural access holds it
//! - At most one non-stopped runner per (category, task id); a stopped entry may be replaced
//! - Entries leave a table only through `running_counts()` (lazy compaction)
//! - No operation waits for a runner; termination is discovered by polling

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    core::runner::TaskRunner,
    error::{RegistryError, RuntimeError},
    events::{Bus, Event, EventKind},
    scheduler::SchedulerRef,
    tasks::{Category, MigrateTask, TaskType, WorkerFactoryRef},
};

type RunnerMap = HashMap<Arc<str>, Arc<TaskRunner>>;

/// The four category tables, guarded together.
#[derive(Default)]
struct CategoryTables {
    repair: RunnerMap,
    balance: RunnerMap,
    disk_drop: RunnerMap,
    manual_migrate: RunnerMap,
    /// Set by shutdown; rejects further submissions.
    closed: bool,
}

impl CategoryTables {
    fn table(&self, category: Category) -> &RunnerMap {
        match category {
            Category::Repair => &self.repair,
            Category::Balance => &self.balance,
            Category::DiskDrop => &self.disk_drop,
            Category::ManualMigrate => &self.manual_migrate,
        }
    }

    fn table_mut(&mut self, category: Category) -> &mut RunnerMap {
        match category {
            Category::Repair => &mut self.repair,
            Category::Balance => &mut self.balance,
            Category::DiskDrop => &mut self.disk_drop,
            Category::ManualMigrate => &mut self.manual_migrate,
        }
    }

    fn runners(&self) -> impl Iterator<Item = &Arc<TaskRunner>> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.table(c).values())
    }
}

/// Number of registered (not yet compacted) runners per category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunningCounts {
    pub repair: usize,
    pub balance: usize,
    pub disk_drop: usize,
    pub manual_migrate: usize,
}

impl RunningCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Repair => self.repair,
            Category::Balance => self.balance,
            Category::DiskDrop => self.disk_drop,
            Category::ManualMigrate => self.manual_migrate,
        }
    }

    pub fn total(&self) -> usize {
        self.repair + self.balance + self.disk_drop + self.manual_migrate
    }
}

/// Per-category registry of migration runners.
pub struct RunnerRegistry {
    cfg: Config,
    tables: Mutex<CategoryTables>,

    factory: WorkerFactoryRef,
    scheduler: SchedulerRef,
    bus: Bus,

    /// Parent of every runner token.
    root: CancellationToken,
    /// Tracks launched runners for shutdown.
    tracker: TaskTracker,
}

impl RunnerRegistry {
    pub(crate) fn new_internal(
        cfg: Config,
        factory: WorkerFactoryRef,
        scheduler: SchedulerRef,
        root: CancellationToken,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            tables: Mutex::new(CategoryTables::default()),
            factory,
            scheduler,
            bus,
            root,
            tracker: TaskTracker::new(),
        }
    }

    /// Registers `task` and launches its runner.
    ///
    /// Returns as soon as the runner is registered; it does not wait for the
    /// migration to start or finish.
    ///
    /// ### Errors
    /// - [`RegistryError::UnsupportedTaskType`] if the declared type is not a migration
    /// - [`RegistryError::DuplicateActiveTask`] if a non-stopped runner holds the id
    /// - [`RegistryError::Closed`] after [`shutdown`](Self::shutdown)
    pub async fn submit(&self, task: MigrateTask) -> Result<(), RegistryError> {
        let category = Category::try_from(task.task_type()).inspect_err(|e| {
            warn!(task_id = task.task_id(), task_type = %task.task_type(), error = %e, "reject task");
        })?;

        let mut tables = self.tables.lock().await;
        if tables.closed {
            return Err(RegistryError::Closed);
        }

        let concurrency = self.cfg.concurrency(category);
        let worker = self.factory.new_migrate_worker(&task);
        let runner = TaskRunner::new(
            &self.root,
            &task,
            category,
            worker,
            concurrency,
            Arc::clone(&self.scheduler),
            self.bus.clone(),
        );

        if let Err(e) = add_runner(tables.table_mut(category), category, &runner) {
            drop(tables);
            self.bus.publish(
                Event::new(EventKind::DuplicateRejected)
                    .with_task(task.task_id())
                    .with_category(category),
            );
            return Err(e);
        }
        self.tracker.spawn(Arc::clone(&runner).run());
        drop(tables);

        debug!(task_id = task.task_id(), category = %category, concurrency, "runner added");
        self.bus.publish(
            Event::new(EventKind::RunnerAdded)
                .with_task(task.task_id())
                .with_category(category),
        );
        Ok(())
    }

    /// Ids of alive runners per category, sorted.
    ///
    /// Categories without alive runners are absent from the map.
    pub async fn alive_tasks(&self) -> BTreeMap<Category, Vec<String>> {
        let tables = self.tables.lock().await;

        let mut all = BTreeMap::new();
        for category in Category::ALL {
            let alive = alive_ids(tables.table(category));
            if !alive.is_empty() {
                all.insert(category, alive);
            }
        }
        all
    }

    /// Sends a stop request to the runner of `task_id` in `category`.
    ///
    /// Returns without waiting for the runner to stop. The entry stays in its table
    /// until compaction.
    pub async fn stop(&self, category: Category, task_id: &str) -> Result<(), RegistryError> {
        let tables = self.tables.lock().await;
        stop_runner(tables.table(category), category, task_id)
    }

    /// Same as [`stop`](Self::stop), addressed by declared task type.
    ///
    /// # Panics
    /// If `task_type` is not a migration type. Callers validate task types before
    /// they reach the registry; anything else is a bug upstream.
    pub async fn stop_task(&self, task_id: &str, task_type: TaskType) -> Result<(), RegistryError> {
        let Ok(category) = Category::try_from(task_type) else {
            panic!("unknown task type {task_type}");
        };
        self.stop(category, task_id).await
    }

    /// Sends a stop request to every alive runner. Entries are not removed.
    pub async fn stop_all_alive(&self) {
        let tables = self.tables.lock().await;
        for runner in tables.runners().filter(|r| r.alive()) {
            runner.stop();
        }
    }

    /// Drops stopped runners from every table and returns the remaining sizes.
    ///
    /// This is the only place entries are removed. The counts include runners that
    /// are registered but have not started yet.
    pub async fn running_counts(&self) -> RunningCounts {
        let mut tables = self.tables.lock().await;
        for category in Category::ALL {
            remove_stopped_runners(tables.table_mut(category), &self.bus);
        }

        RunningCounts {
            repair: tables.repair.len(),
            balance: tables.balance.len(),
            disk_drop: tables.disk_drop.len(),
            manual_migrate: tables.manual_migrate.len(),
        }
    }

    /// Runner registered under `task_id` in `category`, if any.
    pub async fn get_runner(&self, category: Category, task_id: &str) -> Option<Arc<TaskRunner>> {
        let tables = self.tables.lock().await;
        tables.table(category).get(task_id).cloned()
    }

    /// Receiver for runner and registry events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Closes the registry, stops every runner and waits up to `grace` for all
    /// launched runners to finish.
    ///
    /// Entries are left in place; `running_counts()` still compacts them.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        {
            let mut tables = self.tables.lock().await;
            tables.closed = true;
            for runner in tables.runners().filter(|r| !r.stopped()) {
                runner.stop();
            }
        }
        info!(?grace, "registry shutdown requested");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.root.cancel();

        self.tracker.close();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self.stuck_runners().await;
                warn!(?grace, ?stuck, "runners did not stop within grace");
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// [`shutdown`](Self::shutdown) with the configured grace period.
    pub async fn shutdown_default(&self) -> Result<(), RuntimeError> {
        self.shutdown(self.cfg.grace).await
    }

    async fn stuck_runners(&self) -> Vec<String> {
        let tables = self.tables.lock().await;
        let mut stuck: Vec<String> = tables
            .runners()
            .filter(|r| !r.stopped())
            .map(|r| r.task_id().to_string())
            .collect();
        stuck.sort_unstable();
        stuck
    }
}

fn add_runner(
    table: &mut RunnerMap,
    category: Category,
    runner: &Arc<TaskRunner>,
) -> Result<(), RegistryError> {
    if let Some(existing) = table.get(runner.task_id()) {
        if !existing.stopped() {
            warn!(task_id = runner.task_id(), category = %category, state = %existing.state(), "task is running shouldn't add again");
            return Err(RegistryError::DuplicateActiveTask {
                category,
                task_id: runner.task_id().to_string(),
            });
        }
    }
    table.insert(Arc::from(runner.task_id()), Arc::clone(runner));
    Ok(())
}

fn stop_runner(table: &RunnerMap, category: Category, task_id: &str) -> Result<(), RegistryError> {
    match table.get(task_id) {
        Some(runner) => {
            runner.stop();
            Ok(())
        }
        None => Err(RegistryError::TaskNotFound {
            category,
            task_id: task_id.to_string(),
        }),
    }
}

fn alive_ids(table: &RunnerMap) -> Vec<String> {
    let mut alive: Vec<String> = table
        .values()
        .filter(|r| r.alive())
        .map(|r| r.task_id().to_string())
        .collect();
    alive.sort_unstable();
    alive
}

fn remove_stopped_runners(table: &mut RunnerMap, bus: &Bus) {
    table.retain(|task_id, runner| {
        let state = runner.state();
        if state.is_terminal() {
            info!(task_id = %task_id, category = %runner.category(), state = %state, "remove stopped task");
            bus.publish(
                Event::new(EventKind::RunnerRemoved)
                    .with_task(Arc::clone(task_id))
                    .with_category(runner.category())
                    .with_reason(state.as_str()),
            );
            return false;
        }
        debug!(task_id = %task_id, category = %runner.category(), state = %state, "remain task");
        true
    });
}
