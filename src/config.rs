//! # Registry configuration.
//!
//! Provides [`Config`], the settings an owning service hands to
//! [`RunnerRegistry`](crate::RunnerRegistry).
//!
//! ## Sentinel values
//! - `*_concurrency = 0` → treated as 1 (a runner always gets at least one work slot)
//! - `bus_capacity = 0` → treated as 1

use std::time::Duration;

use serde::Deserialize;

use crate::tasks::Category;

/// Per-category concurrency quotas and runtime settings.
///
/// ## Field semantics
/// - `*_concurrency`: quota forwarded to every runner of the category; read once per submission.
///   The registry does not enforce it, the runner's worker does.
/// - `bus_capacity`: event bus ring buffer size
/// - `grace`: default wait for [`RunnerRegistry::shutdown_default`](crate::RunnerRegistry::shutdown_default)
///
/// Can be deserialized from the owning service's config file; missing fields take defaults.
///
/// ```rust
/// use migrate_runner::{Category, Config};
///
/// let cfg: Config = serde_json::from_str(r#"{ "repair_concurrency": 4 }"#).unwrap();
/// assert_eq!(cfg.concurrency(Category::Repair), 4);
/// assert_eq!(cfg.concurrency(Category::Balance), 10);
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repair_concurrency: usize,
    pub balance_concurrency: usize,
    pub disk_drop_concurrency: usize,
    pub manual_migrate_concurrency: usize,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Shutdown grace period.
    #[serde(with = "grace_secs")]
    pub grace: Duration,
}

impl Config {
    /// Returns the concurrency quota of `category`, clamped to a minimum of 1.
    #[inline]
    pub fn concurrency(&self, category: Category) -> usize {
        let raw = match category {
            Category::Repair => self.repair_concurrency,
            Category::Balance => self.balance_concurrency,
            Category::DiskDrop => self.disk_drop_concurrency,
            Category::ManualMigrate => self.manual_migrate_concurrency,
        };
        raw.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - every category quota = 10
    /// - `bus_capacity = 1024`
    /// - `grace = 60s`
    fn default() -> Self {
        Self {
            repair_concurrency: 10,
            balance_concurrency: 10,
            disk_drop_concurrency: 10,
            manual_migrate_concurrency: 10,
            bus_capacity: 1024,
            grace: Duration::from_secs(60),
        }
    }
}

/// `grace` is written in seconds in config files.
mod grace_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
