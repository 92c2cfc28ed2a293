// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reference south plugins.

mod counter;

pub use counter::{CounterConfig, CounterSource};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::PluginError;
use crate::traits::SouthSource;

/// Factory for creating south sources from their plugin name
pub struct SourceFactory;

impl SourceFactory {
    /// Create a source for `service` from its plugin name and options
    pub fn create(
        plugin: &str,
        service: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<Arc<dyn SouthSource>, PluginError> {
        match plugin {
            CounterSource::PLUGIN => Ok(Arc::new(CounterSource::from_options(service, options)?)),
            _ => Err(PluginError::UnknownPlugin {
                kind: "south",
                plugin: plugin.to_string(),
            }),
        }
    }

    /// List all available south plugins
    pub fn list_available_plugins() -> Vec<&'static str> {
        vec![CounterSource::PLUGIN]
    }

    pub fn is_plugin_available(plugin: &str) -> bool {
        Self::list_available_plugins().contains(&plugin)
    }
}
