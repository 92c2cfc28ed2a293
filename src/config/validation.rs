// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Startup validation of the platform configuration.
//!
//! The checks run in three groups and every problem found is reported, so a
//! broken file can be fixed in one pass:
//!
//! 1. **Naming**: names are non-blank, service names are unique across south
//!    and north, filter names are unique and never reuse a service name
//! 2. **References**: every pipeline entry names a defined filter, at most once
//! 3. **Plugins and sizing**: plugin names are known to their factory and
//!    capacities and intervals are non-zero
//!
//! # Example
//! ```rust,ignore
//! use the_northbound::config::{load_config, validate_config};
//!
//! let cfg = load_config("northbound.yaml")?;
//! if let Err(errors) = validate_config(&cfg) {
//!     for error in errors {
//!         eprintln!("Configuration error: {}", error);
//!     }
//! }
//! ```

use std::collections::HashSet;

use crate::backends::{ConnectorFactory, FilterFactory, SourceFactory};
use crate::config::PlatformConfig;
use crate::errors::ConfigError;

/// Validate a configuration before any service is created.
///
/// # Returns
///
/// * `Ok(())` - Configuration can be started
/// * `Err(Vec<ConfigError>)` - Every problem found
pub fn validate_config(config: &PlatformConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    errors.extend(validate_unique_names(config));
    errors.extend(validate_pipeline_references(config));
    errors.extend(validate_plugins(config));
    errors.extend(validate_sizing(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_names(config: &PlatformConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let mut services = HashSet::new();
    let names = config
        .south
        .iter()
        .map(|s| (&s.name, "south"))
        .chain(config.north.iter().map(|n| (&n.name, "north")));
    for (name, kind) in names {
        if name.trim().is_empty() {
            errors.push(ConfigError::EmptyName { kind });
        } else if !services.insert(name) {
            errors.push(ConfigError::DuplicateServiceName {
                service: name.clone(),
            });
        }
    }

    let mut filters = HashSet::new();
    for filter in &config.filters {
        if filter.name.trim().is_empty() {
            errors.push(ConfigError::EmptyName { kind: "filter" });
        } else if !filters.insert(&filter.name) {
            errors.push(ConfigError::DuplicateFilterName {
                filter: filter.name.clone(),
            });
        } else if services.contains(&filter.name) {
            errors.push(ConfigError::ServiceFilterNameClash {
                name: filter.name.clone(),
            });
        }
    }

    errors
}

fn validate_pipeline_references(config: &PlatformConfig) -> Vec<ConfigError> {
    let defined: HashSet<&String> = config.filters.iter().map(|f| &f.name).collect();
    let mut errors = Vec::new();

    for north in &config.north {
        let mut seen = HashSet::new();
        for filter in &north.pipeline {
            if !defined.contains(filter) {
                errors.push(ConfigError::UndefinedFilter {
                    service: north.name.clone(),
                    filter: filter.clone(),
                });
            }
            if !seen.insert(filter) {
                errors.push(ConfigError::DuplicatePipelineEntry {
                    service: north.name.clone(),
                    filter: filter.clone(),
                });
            }
        }
    }

    errors
}

fn validate_plugins(config: &PlatformConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    for south in &config.south {
        if !SourceFactory::is_plugin_available(&south.plugin) {
            errors.push(ConfigError::UnknownPlugin {
                kind: "south",
                name: south.name.clone(),
                plugin: south.plugin.clone(),
            });
        }
    }
    for filter in &config.filters {
        if !FilterFactory::is_plugin_available(&filter.plugin) {
            errors.push(ConfigError::UnknownPlugin {
                kind: "filter",
                name: filter.name.clone(),
                plugin: filter.plugin.clone(),
            });
        }
    }
    for north in &config.north {
        if !ConnectorFactory::is_plugin_available(&north.plugin) {
            errors.push(ConfigError::UnknownPlugin {
                kind: "north",
                name: north.name.clone(),
                plugin: north.plugin.clone(),
            });
        }
    }

    errors
}

fn validate_sizing(config: &PlatformConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let mut require_positive = |setting: String, value: Option<u64>| {
        if value == Some(0) {
            errors.push(ConfigError::ZeroValue { setting });
        }
    };

    require_positive("buffer.capacity".into(), config.buffer.capacity.map(|c| c as u64));
    require_positive("delivery.max_attempts".into(), config.delivery.max_attempts.map(u64::from));
    require_positive("storage.persist_interval_ms".into(), config.storage.persist_interval_ms);
    for south in &config.south {
        require_positive(format!("south.{}.interval_ms", south.name), south.interval_ms);
    }
    for north in &config.north {
        require_positive(format!("north.{}.interval_ms", north.name), north.interval_ms);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> PlatformConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let cfg = parse(
            r#"
south:
  - name: "Counter #1"
    plugin: counter
filters:
  - name: SF1
    plugin: scale
  - name: MD1
    plugin: metadata
north:
  - name: Archive
    plugin: capture
    pipeline: [SF1, MD1]
"#,
        );
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_duplicate_service_names_across_kinds() {
        let cfg = parse(
            r#"
south:
  - name: shared
    plugin: counter
north:
  - name: shared
    plugin: capture
"#,
        );
        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigError::DuplicateServiceName {
                service: "shared".into()
            }]
        );
    }

    #[test]
    fn test_filter_cannot_reuse_a_service_name() {
        let cfg = parse(
            r#"
filters:
  - name: Archive
    plugin: scale
  - name: "  "
    plugin: scale
north:
  - name: Archive
    plugin: capture
"#,
        );
        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ConfigError::ServiceFilterNameClash {
                    name: "Archive".into()
                },
                ConfigError::EmptyName { kind: "filter" },
            ]
        );
    }

    #[test]
    fn test_pipeline_reference_errors_are_accumulated() {
        let cfg = parse(
            r#"
filters:
  - name: SF1
    plugin: scale
north:
  - name: Archive
    plugin: capture
    pipeline: [SF1, SF1, ghost]
"#,
        );
        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ConfigError::DuplicatePipelineEntry {
            service: "Archive".into(),
            filter: "SF1".into()
        }));
        assert!(errors.contains(&ConfigError::UndefinedFilter {
            service: "Archive".into(),
            filter: "ghost".into()
        }));
    }

    #[test]
    fn test_unknown_plugins_and_zero_values() {
        let cfg = parse(
            r#"
buffer:
  capacity: 0
south:
  - name: s
    plugin: sinusoid
    interval_ms: 0
north:
  - name: n
    plugin: kafka
"#,
        );
        let errors = validate_config(&cfg).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownPlugin { kind: "south", .. })));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownPlugin { kind: "north", .. })));
        assert!(errors.contains(&ConfigError::ZeroValue {
            setting: "buffer.capacity".into()
        }));
        assert!(errors.contains(&ConfigError::ZeroValue {
            setting: "south.s.interval_ms".into()
        }));
    }
}
