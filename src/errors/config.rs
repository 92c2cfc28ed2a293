// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Problems found while loading or validating the platform configuration file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The same service name is used more than once across south and north.
    #[error("Duplicate service name: '{service}'")]
    DuplicateServiceName { service: String },

    /// The same filter name is defined more than once.
    #[error("Duplicate filter name: '{filter}'")]
    DuplicateFilterName { filter: String },

    /// Services and filters share one name space.
    #[error("Name '{name}' is used by both a service and a filter")]
    ServiceFilterNameClash { name: String },

    /// A service or filter with a blank name.
    #[error("A {kind} name must not be empty")]
    EmptyName { kind: &'static str },

    /// A north pipeline references a filter that is not defined.
    #[error("North service '{service}' uses filter '{filter}' which is not defined")]
    UndefinedFilter { service: String, filter: String },

    /// A north pipeline lists the same filter twice.
    #[error("North service '{service}' lists filter '{filter}' more than once")]
    DuplicatePipelineEntry { service: String, filter: String },

    /// A plugin name not known to the corresponding factory.
    #[error("Unknown {kind} plugin '{plugin}' for '{name}'")]
    UnknownPlugin {
        kind: &'static str,
        name: String,
        plugin: String,
    },

    /// A numeric setting that has to be positive is zero.
    #[error("Setting '{setting}' must be greater than zero")]
    ZeroValue { setting: String },

    /// Reading the config file failed.
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// The YAML could not be parsed into a platform configuration.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
