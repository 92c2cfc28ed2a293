// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for building filters, connectors and sources from their plugin name
//! and configuration category.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    /// No factory knows this plugin name.
    #[error("Unknown {kind} plugin: '{plugin}'")]
    UnknownPlugin { kind: &'static str, plugin: String },

    /// The category holds a value the plugin cannot use.
    #[error("Invalid value for '{key}' in plugin '{plugin}': {reason}")]
    InvalidOption {
        plugin: String,
        key: String,
        reason: String,
    },
}
