// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reference filter plugins and the factory that builds them.

mod metadata;
mod rename;
mod scale;

pub use metadata::MetadataFilter;
pub use rename::RenameFilter;
pub use scale::{ScaleConfig, ScaleFilter};

use std::sync::Arc;

use crate::config::consts::{ENABLE_ITEM, PLUGIN_ITEM};
use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::errors::PluginError;
use crate::traits::Filter;

/// Factory for creating filter instances from their plugin name
pub struct FilterFactory;

impl FilterFactory {
    /// Default category for a filter plugin.
    ///
    /// Every filter category carries a read-only `plugin` item and an
    /// `enable` item next to the plugin's own options. The category is named
    /// after the plugin; callers rename it for the filter or stage it serves.
    pub fn category(plugin: &str) -> Result<ConfigCategory, PluginError> {
        let base = ConfigCategory::new(plugin, format!("{} filter", plugin))
            .with_item(
                PLUGIN_ITEM,
                ConfigItem::new(ItemType::String, "Filter plugin", plugin).readonly(),
            )
            .with_item(
                ENABLE_ITEM,
                ConfigItem::new(ItemType::Boolean, "Apply this filter", "true"),
            );

        match plugin {
            ScaleFilter::PLUGIN => Ok(ScaleFilter::schema(base)),
            MetadataFilter::PLUGIN => Ok(MetadataFilter::schema(base)),
            RenameFilter::PLUGIN => Ok(RenameFilter::schema(base)),
            _ => Err(Self::unknown(plugin)),
        }
    }

    /// Create a filter from its plugin name and current category values
    pub fn create(plugin: &str, category: &ConfigCategory) -> Result<Arc<dyn Filter>, PluginError> {
        match plugin {
            ScaleFilter::PLUGIN => Ok(Arc::new(ScaleFilter::from_category(category)?)),
            MetadataFilter::PLUGIN => Ok(Arc::new(MetadataFilter::from_category(category)?)),
            RenameFilter::PLUGIN => Ok(Arc::new(RenameFilter::from_category(category)?)),
            _ => Err(Self::unknown(plugin)),
        }
    }

    /// List all available filter plugins
    pub fn list_available_plugins() -> Vec<&'static str> {
        vec![ScaleFilter::PLUGIN, MetadataFilter::PLUGIN, RenameFilter::PLUGIN]
    }

    pub fn is_plugin_available(plugin: &str) -> bool {
        Self::list_available_plugins().contains(&plugin)
    }

    fn unknown(plugin: &str) -> PluginError {
        PluginError::UnknownPlugin {
            kind: "filter",
            plugin: plugin.to_string(),
        }
    }
}
