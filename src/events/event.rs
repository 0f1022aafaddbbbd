//! # Runtime events emitted by the registry and task runners.
//!
//! The [`EventKind`] enum classifies event types across three groups:
//! - **Registry events**: runner added, duplicate rejected, runner removed by compaction
//! - **Runner events**: starting, stop requested, terminal outcome
//! - **Shutdown events**: shutdown requested, finished within grace, grace exceeded
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use migrate_runner::{Category, Event, EventKind};
//!
//! let ev = Event::new(EventKind::RunnerFailed)
//!     .with_task("repair-1")
//!     .with_category(Category::Repair)
//!     .with_reason("io error");
//!
//! assert_eq!(ev.kind, EventKind::RunnerFailed);
//! assert_eq!(ev.task.as_deref(), Some("repair-1"));
//! assert_eq!(ev.reason.as_deref(), Some("io error"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::Category;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// Runner registered and launched.
    ///
    /// Sets: `task`, `category`
    RunnerAdded,

    /// Submission rejected because a non-stopped runner holds the id.
    ///
    /// Sets: `task`, `category`
    DuplicateRejected,

    /// Stopped runner dropped by compaction.
    ///
    /// Sets: `task`, `category`, `reason` (final state)
    RunnerRemoved,

    // === Runner events ===
    /// Runner began executing its worker.
    ///
    /// Sets: `task`, `category`
    RunnerStarting,

    /// Stop requested for a runner (cooperative, not yet honored).
    ///
    /// Sets: `task`, `category`
    StopRequested,

    /// Worker finished successfully.
    ///
    /// Sets: `task`, `category`
    RunnerSucceeded,

    /// Worker returned an error.
    ///
    /// Sets: `task`, `category`, `reason`
    RunnerFailed,

    /// Runner honored a stop request.
    ///
    /// Sets: `task`, `category`
    RunnerStopped,

    // === Shutdown events ===
    /// Registry shutdown started.
    ShutdownRequested,

    /// All launched runners finished within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some runners did not stop in time.
    ///
    /// Sets: `reason` (stuck ids)
    GraceExceeded,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task id, if applicable.
    pub task: Option<Arc<str>>,
    /// Category of the task, if applicable.
    pub category: Option<Category>,
    /// Human-readable reason (errors, final state, ...).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            category: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    #[inline]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Shorthand for an event about one runner.
    #[inline]
    pub(crate) fn runner(kind: EventKind, task: &Arc<str>, category: Category) -> Self {
        Event::new(kind)
            .with_task(Arc::clone(task))
            .with_category(category)
    }
}
