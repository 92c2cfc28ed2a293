// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_DRAIN_WAIT_MS, DEFAULT_INITIAL_BACKOFF_MS,
    DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_PERSIST_INTERVAL_MS,
};
use crate::engine::buffer::OverflowPolicy;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for the platform.
///
/// Describes the services to create on first start, the filters they can
/// use, and the engine-wide buffer, delivery and storage settings. It is
/// typically loaded from a YAML file. Once the platform has persisted state,
/// the persisted services win over the ones listed here.
///
/// # Example
/// ```yaml
/// storage:
///   path: /var/lib/northbound/state.json
/// buffer:
///   capacity: 10000
///   overflow: drop_oldest
/// delivery:
///   max_attempts: 3
/// south:
///   - name: "Counter #1"
///     plugin: counter
///     interval_ms: 1000
///     options:
///       asset: counter
/// filters:
///   - name: SF1
///     plugin: scale
///     options:
///       factor: 2
/// north:
///   - name: Archive
///     plugin: capture
///     pipeline: [SF1]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub south: Vec<SouthServiceConfig>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub north: Vec<NorthServiceConfig>,
}

/// Where platform state is persisted between restarts.
///
/// Without a `path` the state lives in memory and only survives
/// [`Platform::restart`](crate::engine::Platform::restart), not process exit.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    pub persist_interval_ms: Option<u64>,
}

impl StorageConfig {
    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms.unwrap_or(DEFAULT_PERSIST_INTERVAL_MS))
    }
}

/// Sizing and overflow behaviour of every north service's reading buffer.
#[derive(Debug, Default, Deserialize)]
pub struct BufferConfig {
    pub capacity: Option<usize>,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl BufferConfig {
    pub fn get_capacity(&self) -> usize {
        self.capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY)
    }
}

/// Retry and drain settings for north delivery.
///
/// # Fields
/// * `max_attempts` - Send attempts per cycle for transient failures (defaults to 3)
/// * `initial_backoff_ms` - Delay before the first retry (defaults to 100ms)
/// * `max_backoff_ms` - Cap on the doubling retry delay (defaults to 2s)
/// * `drain_wait_ms` - How long a cycle waits on an empty buffer (defaults to 250ms)
#[derive(Debug, Default, Deserialize)]
pub struct DeliveryConfig {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub drain_wait_ms: Option<u64>,
}

impl DeliveryConfig {
    pub fn get_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn get_initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms.unwrap_or(DEFAULT_INITIAL_BACKOFF_MS))
    }

    pub fn get_max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.unwrap_or(DEFAULT_MAX_BACKOFF_MS))
    }

    pub fn get_drain_wait(&self) -> Duration {
        Duration::from_millis(self.drain_wait_ms.unwrap_or(DEFAULT_DRAIN_WAIT_MS))
    }
}

/// A south service: a source plugin run on a fixed cadence.
#[derive(Debug, Deserialize)]
pub struct SouthServiceConfig {
    pub name: String,
    pub plugin: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub options: BTreeMap<String, serde_yaml::Value>, // plugin-specific options
}

/// A named filter definition that north pipelines refer to.
#[derive(Debug, Deserialize)]
pub struct FilterConfig {
    pub name: String,
    pub plugin: String,
    #[serde(default)]
    pub options: BTreeMap<String, serde_yaml::Value>,
}

/// A north service: connector plugin, its pipeline and its schedule.
#[derive(Debug, Deserialize)]
pub struct NorthServiceConfig {
    pub name: String,
    pub plugin: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub options: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub pipeline: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Interval of a service, falling back to the engine default.
pub fn interval_or_default(interval_ms: Option<u64>) -> Duration {
    Duration::from_millis(interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
}

/// Render YAML option scalars as the text values categories store.
///
/// Sequences and mappings are rendered as JSON so they can feed `json` items.
pub fn option_strings(options: &BTreeMap<String, serde_yaml::Value>) -> BTreeMap<String, String> {
    options
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Null => String::new(),
                other => serde_json::to_string(other).unwrap_or_default(),
            };
            (key.clone(), text)
        })
        .collect()
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PlatformConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: PlatformConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a config from a YAML file
///
/// All validation problems are collected and reported together.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PlatformConfig, Vec<ConfigError>> {
    let cfg = load_config(path).map_err(|e| vec![e])?;
    crate::config::validate_config(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
south:
  - name: "Counter #1"
    plugin: counter
    options:
      asset: counter
north:
  - name: Archive
    plugin: capture
    interval_ms: 200
    pipeline: [SF1]
filters:
  - name: SF1
    plugin: scale
    options:
      factor: 2
"#;

        let cfg: PlatformConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.south.len(), 1);
        assert!(cfg.south[0].enabled);
        assert_eq!(cfg.north[0].pipeline, vec!["SF1"]);
        assert_eq!(cfg.north[0].interval_ms, Some(200));
        assert_eq!(option_strings(&cfg.filters[0].options)["factor"], "2");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg: PlatformConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(cfg.buffer.get_capacity(), DEFAULT_BUFFER_CAPACITY);
        assert_eq!(cfg.buffer.overflow, OverflowPolicy::DropOldest);
        assert_eq!(cfg.delivery.get_max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(cfg.delivery.get_max_backoff(), Duration::from_millis(DEFAULT_MAX_BACKOFF_MS));
        assert_eq!(cfg.storage.persist_interval(), Duration::from_millis(DEFAULT_PERSIST_INTERVAL_MS));
        assert!(cfg.storage.path.is_none());
    }

    #[test]
    fn test_custom_buffer_and_delivery_settings() {
        let yaml = r#"
buffer:
  capacity: 50
  overflow: reject_newest
delivery:
  max_attempts: 5
  initial_backoff_ms: 10
  drain_wait_ms: 20
"#;

        let cfg: PlatformConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.buffer.get_capacity(), 50);
        assert_eq!(cfg.buffer.overflow, OverflowPolicy::RejectNewest);
        assert_eq!(cfg.delivery.get_max_attempts(), 5);
        assert_eq!(cfg.delivery.get_initial_backoff(), Duration::from_millis(10));
        assert_eq!(cfg.delivery.get_drain_wait(), Duration::from_millis(20));
    }

    #[test]
    fn test_option_strings_render_nested_values_as_json() {
        let yaml = r#"
name: MD1
plugin: metadata
options:
  config:
    site: north-field
  enable: false
"#;
        let filter: FilterConfig = serde_yaml::from_str(yaml).unwrap();
        let options = option_strings(&filter.options);
        assert_eq!(options["enable"], "false");
        let parsed: serde_json::Value = serde_json::from_str(&options["config"]).unwrap();
        assert_eq!(parsed["site"], "north-field");
    }

    #[test]
    fn test_load_and_validate_reports_undefined_filter() {
        let yaml = r#"
north:
  - name: Archive
    plugin: capture
    pipeline: [missing]
"#;
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), yaml).unwrap();

        let errors = load_and_validate_config(file.path()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::UndefinedFilter { filter, .. } if filter == "missing")));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/northbound.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
