//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish
//! runner and registry lifecycle events to observers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `RunnerRegistry` (add/reject/remove/shutdown), `TaskRunner` (start/finish/stop).
//! - **Consumers**: whoever calls [`RunnerRegistry::subscribe`](crate::RunnerRegistry::subscribe).
//!   The registry itself never listens: liveness is discovered by polling.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
