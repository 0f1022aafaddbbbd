//! # Task types and migration categories.
//!
//! [`TaskType`] is the type an upstream scheduler declares on a task. Only four of
//! them are migrations; each of those resolves to exactly one [`Category`].
//!
//! ```text
//! TaskType::DiskRepair    ──► Category::Repair
//! TaskType::Balance       ──► Category::Balance
//! TaskType::DiskDrop      ──► Category::DiskDrop
//! TaskType::ManualMigrate ──► Category::ManualMigrate
//! TaskType::ShardRepair   ──► (not a migration)
//! TaskType::BlobDelete    ──► (not a migration)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Task type as declared by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    DiskRepair,
    Balance,
    DiskDrop,
    ManualMigrate,
    ShardRepair,
    BlobDelete,
}

impl TaskType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::DiskRepair => "disk_repair",
            TaskType::Balance => "balance",
            TaskType::DiskDrop => "disk_drop",
            TaskType::ManualMigrate => "manual_migrate",
            TaskType::ShardRepair => "shard_repair",
            TaskType::BlobDelete => "blob_delete",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration category.
///
/// Each category owns an independent task id namespace and concurrency quota.
/// Ordering follows [`Category::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Repair,
    Balance,
    DiskDrop,
    ManualMigrate,
}

impl Category {
    /// All categories in table order.
    pub const ALL: [Category; 4] = [
        Category::Repair,
        Category::Balance,
        Category::DiskDrop,
        Category::ManualMigrate,
    ];

    /// Task type that resolves to this category.
    pub fn task_type(self) -> TaskType {
        match self {
            Category::Repair => TaskType::DiskRepair,
            Category::Balance => TaskType::Balance,
            Category::DiskDrop => TaskType::DiskDrop,
            Category::ManualMigrate => TaskType::ManualMigrate,
        }
    }

    /// Short stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Repair => "repair",
            Category::Balance => "balance",
            Category::DiskDrop => "disk_drop",
            Category::ManualMigrate => "manual_migrate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<TaskType> for Category {
    type Error = RegistryError;

    fn try_from(task_type: TaskType) -> Result<Self, Self::Error> {
        match task_type {
            TaskType::DiskRepair => Ok(Category::Repair),
            TaskType::Balance => Ok(Category::Balance),
            TaskType::DiskDrop => Ok(Category::DiskDrop),
            TaskType::ManualMigrate => Ok(Category::ManualMigrate),
            other => Err(RegistryError::UnsupportedTaskType { task_type: other }),
        }
    }
}
