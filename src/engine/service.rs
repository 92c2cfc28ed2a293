// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request and view types of the management surface.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::config::consts::DEFAULT_INTERVAL_MS;
use crate::config::{interval_or_default, option_strings, NorthServiceConfig, SouthServiceConfig};
use crate::engine::scheduler::TaskState;

/// Definition of a service to create.
///
/// # Example
/// ```rust
/// use the_northbound::engine::ServiceSpec;
/// use std::time::Duration;
///
/// let spec = ServiceSpec::new("Counter #1", "counter")
///     .interval(Duration::from_millis(200))
///     .option("asset", "pump");
///
/// assert!(spec.enabled);
/// assert_eq!(spec.options["asset"], "pump");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub plugin: String,
    pub enabled: bool,
    pub interval: Duration,
    pub options: BTreeMap<String, String>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin: plugin.into(),
            enabled: true,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            options: BTreeMap::new(),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl From<&SouthServiceConfig> for ServiceSpec {
    fn from(config: &SouthServiceConfig) -> Self {
        Self {
            name: config.name.clone(),
            plugin: config.plugin.clone(),
            enabled: config.enabled,
            interval: interval_or_default(config.interval_ms),
            options: option_strings(&config.options),
        }
    }
}

impl From<&NorthServiceConfig> for ServiceSpec {
    fn from(config: &NorthServiceConfig) -> Self {
        Self {
            name: config.name.clone(),
            plugin: config.plugin.clone(),
            enabled: config.enabled,
            interval: interval_or_default(config.interval_ms),
            options: option_strings(&config.options),
        }
    }
}

/// How `update_pipeline` combines the given filters with the current ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineUpdate {
    /// Add after the current stages instead of replacing them.
    pub append: bool,
    /// Skip filters already present instead of failing with `Conflict`.
    pub allow_duplicates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceKind {
    South,
    North,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub kind: ServiceKind,
    pub plugin: String,
    pub enabled: bool,
    pub schedule_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SouthServiceInfo {
    pub name: String,
    pub plugin: String,
    pub enabled: bool,
    /// Readings ingested per asset this service has produced.
    pub assets: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NorthServiceInfo {
    pub name: String,
    pub plugin: String,
    pub schedule_id: Uuid,
    pub enabled: bool,
    pub state: TaskState,
    /// Readings delivered under this service name.
    pub sent: u64,
    /// Readings waiting in the buffer.
    pub pending: usize,
    pub pipeline: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterInfo {
    pub name: String,
    pub plugin: String,
    /// North services whose pipeline contains this filter.
    pub used_by: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PingInfo {
    pub uptime: Duration,
    pub data_read: u64,
    pub data_sent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSummary {
    pub asset: String,
    pub count: u64,
}
