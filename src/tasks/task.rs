//! # Migration task descriptor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tasks::TaskType;

/// Task handed over by the scheduler.
///
/// Only the fields the registry needs are modeled here; the worker factory is free
/// to carry richer descriptors of its own.
///
/// ## Example
/// ```rust
/// use migrate_runner::{MigrateTask, TaskType};
///
/// let task = MigrateTask::new("repair-7", TaskType::DiskRepair, "z0");
/// assert_eq!(task.task_id(), "repair-7");
/// assert_eq!(task.source_idc(), "z0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateTask {
    task_id: Arc<str>,
    task_type: TaskType,
    source_idc: Arc<str>,
}

impl MigrateTask {
    /// Creates a new descriptor.
    pub fn new(
        task_id: impl Into<Arc<str>>,
        task_type: TaskType,
        source_idc: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type,
            source_idc: source_idc.into(),
        }
    }

    /// Task id, unique within its category.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Declared task type.
    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Source location (IDC) of the data being migrated.
    pub fn source_idc(&self) -> &str {
        &self.source_idc
    }

    pub(crate) fn task_id_arc(&self) -> Arc<str> {
        Arc::clone(&self.task_id)
    }

    pub(crate) fn source_idc_arc(&self) -> Arc<str> {
        Arc::clone(&self.source_idc)
    }
}
