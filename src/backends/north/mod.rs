// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reference north connectors and the factory that builds them.

mod capture;
pub mod http_json;
mod log;
mod transport;

pub use capture::{CaptureConnector, CaptureSink};
pub use http_json::HttpJsonConnector;
pub use log::LogConnector;
pub use transport::{InMemoryTransport, Transport, TransportRequest};

use std::sync::Arc;

use crate::config::consts::{BLOCK_SIZE_ITEM, DEFAULT_BLOCK_SIZE, PLUGIN_ITEM};
use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::errors::PluginError;
use crate::traits::NorthConnector;

/// Factory for creating north connectors from their plugin name
///
/// Connectors created by one factory share its [`CaptureSink`] and its
/// [`Transport`], so a caller holding the factory can observe what was sent.
#[derive(Clone)]
pub struct ConnectorFactory {
    capture: CaptureSink,
    transport: Arc<dyn Transport>,
}

impl Default for ConnectorFactory {
    fn default() -> Self {
        Self {
            capture: CaptureSink::new(),
            transport: Arc::new(InMemoryTransport::new()),
        }
    }
}

impl ConnectorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `transport` for every `http_json` connector.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn capture_sink(&self) -> CaptureSink {
        self.capture.clone()
    }

    /// Default category for a connector plugin, named after the plugin.
    ///
    /// Every connector category carries a read-only `plugin` item and
    /// `blockSize`, the most readings sent per cycle.
    pub fn category(plugin: &str) -> Result<ConfigCategory, PluginError> {
        let base = ConfigCategory::new(plugin, format!("{} north connector", plugin))
            .with_item(
                PLUGIN_ITEM,
                ConfigItem::new(ItemType::String, "Connector plugin", plugin).readonly(),
            )
            .with_item(
                BLOCK_SIZE_ITEM,
                ConfigItem::new(
                    ItemType::Integer,
                    "Readings sent per cycle",
                    DEFAULT_BLOCK_SIZE.to_string(),
                ),
            );

        match plugin {
            CaptureConnector::PLUGIN => Ok(CaptureConnector::schema(base)),
            LogConnector::PLUGIN => Ok(LogConnector::schema(base)),
            HttpJsonConnector::PLUGIN => Ok(HttpJsonConnector::schema(base)),
            _ => Err(Self::unknown(plugin)),
        }
    }

    /// Create a connector instance for `plugin`
    pub fn create(&self, plugin: &str) -> Result<Arc<dyn NorthConnector>, PluginError> {
        match plugin {
            CaptureConnector::PLUGIN => Ok(Arc::new(CaptureConnector::new(self.capture.clone()))),
            LogConnector::PLUGIN => Ok(Arc::new(LogConnector)),
            HttpJsonConnector::PLUGIN => Ok(Arc::new(HttpJsonConnector::new(Arc::clone(&self.transport)))),
            _ => Err(Self::unknown(plugin)),
        }
    }

    /// List all available north plugins
    pub fn list_available_plugins() -> Vec<&'static str> {
        vec![
            CaptureConnector::PLUGIN,
            LogConnector::PLUGIN,
            HttpJsonConnector::PLUGIN,
        ]
    }

    pub fn is_plugin_available(plugin: &str) -> bool {
        Self::list_available_plugins().contains(&plugin)
    }

    fn unknown(plugin: &str) -> PluginError {
        PluginError::UnknownPlugin {
            kind: "north",
            plugin: plugin.to_string(),
        }
    }
}
