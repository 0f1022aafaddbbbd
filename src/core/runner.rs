//! # TaskRunner: executes one migration task.
//!
//! A runner is created by the registry for every accepted submission and launched
//! as its own tokio task. It owns a child [`CancellationToken`] of the registry's
//! root token; [`TaskRunner::stop`] cancels it and returns immediately.
//!
//! ## State machine
//! ```text
//!            run()                      worker Ok
//! Inited ───────────► Running ─────────────────────────► Succeeded
//!   │                   │  │        worker Err
//!   │                   │  └───────────────────────────► Failed
//!   │                   │ stop() or parent cancel
//!   │                   ▼
//!   │                Stopping ──── worker returns ──────► Stopped | Succeeded | Failed
//!   │
//!   └── token already cancelled when run() starts ──────► Stopped
//! ```
//!
//! ## Rules
//! - `alive()` is true only in `Running` with an uncancelled token
//! - `stopped()` is true only in a terminal state (`Succeeded`, `Failed`, `Stopped`)
//! - State lives in an atomic: both queries are safe while the runner executes
//! - `run()` is one-shot; the terminal outcome is reported to the scheduler before
//!   the terminal state becomes visible

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::WorkerError,
    events::{Bus, Event, EventKind},
    scheduler::{SchedulerRef, TaskOutcome, TaskReport},
    tasks::{Category, MigrateTask, RunContext, WorkerRef},
};

/// Lifecycle state of a [`TaskRunner`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Inited = 0,
    Running = 1,
    Stopping = 2,
    Succeeded = 3,
    Failed = 4,
    Stopped = 5,
}

impl RunnerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunnerState::Inited,
            1 => RunnerState::Running,
            2 => RunnerState::Stopping,
            3 => RunnerState::Succeeded,
            4 => RunnerState::Failed,
            _ => RunnerState::Stopped,
        }
    }

    /// True for `Succeeded`, `Failed` and `Stopped`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunnerState::Succeeded | RunnerState::Failed | RunnerState::Stopped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunnerState::Inited => "inited",
            RunnerState::Running => "running",
            RunnerState::Stopping => "stopping",
            RunnerState::Succeeded => "succeeded",
            RunnerState::Failed => "failed",
            RunnerState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs one migration task to completion or until a stop request is honored.
pub struct TaskRunner {
    task_id: Arc<str>,
    category: Category,
    source_idc: Arc<str>,
    /// Concurrency quota handed to the worker.
    concurrency: usize,

    worker: WorkerRef,
    scheduler: SchedulerRef,
    bus: Bus,

    token: CancellationToken,
    state: AtomicU8,
    launched: AtomicBool,
    /// Set once `StopRequested` has been published.
    stop_seen: AtomicBool,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("task_id", &self.task_id)
            .field("category", &self.category)
            .field("state", &self.state())
            .finish()
    }
}

impl TaskRunner {
    /// Creates a runner bound to `task`; its token is a child of `parent`.
    pub fn new(
        parent: &CancellationToken,
        task: &MigrateTask,
        category: Category,
        worker: WorkerRef,
        concurrency: usize,
        scheduler: SchedulerRef,
        bus: Bus,
    ) -> Arc<Self> {
        Arc::new(Self {
            task_id: task.task_id_arc(),
            category,
            source_idc: task.source_idc_arc(),
            concurrency,
            worker,
            scheduler,
            bus,
            token: parent.child_token(),
            state: AtomicU8::new(RunnerState::Inited as u8),
            launched: AtomicBool::new(false),
            stop_seen: AtomicBool::new(false),
        })
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

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Current state (diagnostics only; may change right after the call).
    #[inline]
    pub fn state(&self) -> RunnerState {
        RunnerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Runner is executing and no stop has been requested.
    ///
    /// A cancelled parent token counts as a stop request.
    #[inline]
    pub fn alive(&self) -> bool {
        self.state() == RunnerState::Running && !self.token.is_cancelled()
    }

    /// Runner reached a terminal state.
    #[inline]
    pub fn stopped(&self) -> bool {
        self.state().is_terminal()
    }

    /// Requests a cooperative stop. Idempotent, never waits.
    pub fn stop(&self) {
        self.token.cancel();
        self.mark_stopping();
    }

    /// Moves `Running` to `Stopping` and publishes `StopRequested` once.
    fn mark_stopping(&self) {
        self.transition(RunnerState::Running, RunnerState::Stopping);

        if !self.stop_seen.swap(true, Ordering::AcqRel) {
            debug!(task_id = %self.task_id, category = %self.category, state = %self.state(), "stop requested");
            self.bus.publish(Event::runner(
                EventKind::StopRequested,
                &self.task_id,
                self.category,
            ));
        }
    }

    /// Executes the worker once and drives the runner to a terminal state.
    ///
    /// Meant to be spawned right after registration; repeated calls return immediately.
    pub async fn run(self: Arc<Self>) {
        if self.launched.swap(true, Ordering::AcqRel) {
            warn!(task_id = %self.task_id, "runner launched twice, ignoring");
            return;
        }
        if self.token.is_cancelled() || !self.transition(RunnerState::Inited, RunnerState::Running)
        {
            self.finish(RunnerState::Stopped, TaskOutcome::Stopped).await;
            return;
        }

        info!(
            task_id = %self.task_id,
            category = %self.category,
            source_idc = %self.source_idc,
            concurrency = self.concurrency,
            "runner started"
        );
        self.bus.publish(Event::runner(
            EventKind::RunnerStarting,
            &self.task_id,
            self.category,
        ));

        let ctx = RunContext::new(
            Arc::clone(&self.task_id),
            self.category,
            Arc::clone(&self.source_idc),
            self.concurrency,
            self.token.clone(),
        );
        let worker = Arc::clone(&self.worker);
        let mut join = tokio::spawn(async move { worker.run(ctx).await });
        // The token may be cancelled through a parent without calling `stop()`.
        let joined = tokio::select! {
            joined = &mut join => joined,
            _ = self.token.cancelled() => {
                self.mark_stopping();
                join.await
            }
        };
        let res = match joined {
            Ok(res) => res,
            Err(_join) => Err(WorkerError::Fatal {
                error: "worker panicked".to_string(),
            }),
        };

        match res {
            Ok(()) => self.finish(RunnerState::Succeeded, TaskOutcome::Succeeded).await,
            Err(WorkerError::Canceled) => {
                self.finish(RunnerState::Stopped, TaskOutcome::Stopped).await
            }
            Err(e) if self.token.is_cancelled() => {
                debug!(task_id = %self.task_id, error = %e, "worker error after stop request");
                self.finish(RunnerState::Stopped, TaskOutcome::Stopped).await
            }
            Err(e) => {
                let reason = e.to_string();
                self.finish(RunnerState::Failed, TaskOutcome::Failed { reason })
                    .await
            }
        }
    }

    /// Reports the outcome, then publishes the terminal state.
    async fn finish(&self, state: RunnerState, outcome: TaskOutcome) {
        let event = match &outcome {
            TaskOutcome::Succeeded => {
                info!(task_id = %self.task_id, category = %self.category, "runner succeeded");
                Event::runner(EventKind::RunnerSucceeded, &self.task_id, self.category)
            }
            TaskOutcome::Failed { reason } => {
                warn!(task_id = %self.task_id, category = %self.category, reason = %reason, "runner failed");
                Event::runner(EventKind::RunnerFailed, &self.task_id, self.category)
                    .with_reason(reason.as_str())
            }
            TaskOutcome::Stopped => {
                info!(task_id = %self.task_id, category = %self.category, "runner stopped");
                Event::runner(EventKind::RunnerStopped, &self.task_id, self.category)
            }
        };

        let report = TaskReport {
            task_id: Arc::clone(&self.task_id),
            category: self.category,
            outcome,
        };
        if let Err(e) = self.scheduler.report(report).await {
            warn!(task_id = %self.task_id, category = %self.category, error = %e, "report to scheduler failed");
        }

        self.state.store(state as u8, Ordering::Release);
        self.bus.publish(event);
    }

    fn transition(&self, from: RunnerState, to: RunnerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::NoopScheduler;
    use crate::tasks::{TaskType, WorkerFn};

    fn runner(worker: WorkerRef, parent: &CancellationToken) -> Arc<TaskRunner> {
        let task = MigrateTask::new("t1", TaskType::DiskRepair, "z0");
        TaskRunner::new(
            parent,
            &task,
            Category::Repair,
            worker,
            3,
            Arc::new(NoopScheduler),
            Bus::new(16),
        )
    }

    #[tokio::test]
    async fn test_success_is_terminal() {
        let r = runner(
            WorkerFn::arc(|ctx: RunContext| async move {
                assert_eq!(ctx.concurrency(), 3);
                Ok::<(), WorkerError>(())
            }),
            &CancellationToken::new(),
        );
        assert_eq!(r.state(), RunnerState::Inited);
        assert!(!r.alive());
        assert!(!r.stopped());

        Arc::clone(&r).run().await;
        assert_eq!(r.state(), RunnerState::Succeeded);
        assert!(r.stopped());
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let r = runner(
            WorkerFn::arc(|_ctx: RunContext| async { Err::<(), _>(WorkerError::fail("disk gone")) }),
            &CancellationToken::new(),
        );
        Arc::clone(&r).run().await;
        assert_eq!(r.state(), RunnerState::Failed);
    }

    #[tokio::test]
    async fn test_panic_is_failure() {
        let r = runner(
            WorkerFn::arc(|_ctx: RunContext| async {
                if true {
                    panic!("boom");
                }
                Ok::<(), WorkerError>(())
            }),
            &CancellationToken::new(),
        );
        Arc::clone(&r).run().await;
        assert_eq!(r.state(), RunnerState::Failed);
    }

    #[tokio::test]
    async fn test_stop_before_run_skips_worker() {
        let r = runner(
            WorkerFn::arc(|_ctx: RunContext| async {
                if true {
                    panic!("must not run");
                }
                Ok::<(), WorkerError>(())
            }),
            &CancellationToken::new(),
        );
        r.stop();
        Arc::clone(&r).run().await;
        assert_eq!(r.state(), RunnerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_while_running() {
        let r = runner(
            WorkerFn::arc(|ctx: RunContext| async move {
                ctx.token().cancelled().await;
                Err::<(), _>(WorkerError::Canceled)
            }),
            &CancellationToken::new(),
        );
        let handle = tokio::spawn(Arc::clone(&r).run());
        while !r.alive() {
            tokio::task::yield_now().await;
        }

        r.stop();
        assert_eq!(r.state(), RunnerState::Stopping);
        assert!(!r.alive());
        r.stop();

        handle.await.unwrap();
        assert_eq!(r.state(), RunnerState::Stopped);
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_runner() {
        let parent = CancellationToken::new();
        let r = runner(
            WorkerFn::arc(|_ctx: RunContext| async { Ok::<(), WorkerError>(()) }),
            &parent,
        );
        parent.cancel();
        Arc::clone(&r).run().await;
        assert_eq!(r.state(), RunnerState::Stopped);
    }

    #[tokio::test]
    async fn test_parent_cancel_while_running_stops_liveness() {
        let parent = CancellationToken::new();
        let release = CancellationToken::new();
        let gate = release.clone();
        let r = runner(
            WorkerFn::arc(move |_ctx: RunContext| {
                let gate = gate.clone();
                async move {
                    gate.cancelled().await;
                    Ok::<(), WorkerError>(())
                }
            }),
            &parent,
        );
        let mut events = r.bus.subscribe();
        let handle = tokio::spawn(Arc::clone(&r).run());
        while !r.alive() {
            tokio::task::yield_now().await;
        }

        parent.cancel();
        assert!(!r.alive());
        while r.state() != RunnerState::Stopping {
            tokio::task::yield_now().await;
        }
        r.stop();

        release.cancel();
        handle.await.unwrap();
        assert_eq!(r.state(), RunnerState::Succeeded);

        let mut stop_requests = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::StopRequested {
                stop_requests += 1;
            }
        }
        assert_eq!(stop_requests, 1);
    }

    #[tokio::test]
    async fn test_accessors() {
        let r = runner(
            WorkerFn::arc(|_ctx: RunContext| async { Ok::<(), WorkerError>(()) }),
            &CancellationToken::new(),
        );
        assert_eq!(r.task_id(), "t1");
        assert_eq!(r.category(), Category::Repair);
        assert_eq!(r.source_idc(), "z0");
        assert_eq!(r.concurrency(), 3);
    }

    #[tokio::test]
    async fn test_run_is_one_shot() {
        let r = runner(
            WorkerFn::arc(|_ctx: RunContext| async { Ok::<(), WorkerError>(()) }),
            &CancellationToken::new(),
        );
        Arc::clone(&r).run().await;
        Arc::clone(&r).run().await;
        assert_eq!(r.state(), RunnerState::Succeeded);
    }
}
