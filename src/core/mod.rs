//! Registry core: runners and their bookkeeping.
//!
//! Internal modules:
//! - [`runner`]: executes one migration task with cooperative cancellation;
//! - [`registry`]: per-category tables, submission, stop, enumeration and compaction;
//! - [`builder`]: wiring of a registry instance.

mod builder;
mod registry;
mod runner;

pub use builder::RegistryBuilder;
pub use registry::{RunnerRegistry, RunningCounts};
pub use runner::{RunnerState, TaskRunner};
