// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::errors::PluginError;
use crate::model::Reading;
use crate::traits::Filter;

/// Rename filter - replaces the asset code of every reading
///
/// An empty `asset` leaves readings unchanged.
pub struct RenameFilter {
    asset: String,
}

impl RenameFilter {
    pub const PLUGIN: &'static str = "rename";

    pub fn new(asset: impl Into<String>) -> Self {
        Self { asset: asset.into() }
    }

    pub fn schema(category: ConfigCategory) -> ConfigCategory {
        category.with_item("asset", ConfigItem::new(ItemType::String, "New asset code", ""))
    }

    pub fn from_category(category: &ConfigCategory) -> Result<Self, PluginError> {
        Ok(Self::new(category.get("asset").unwrap_or_default().trim()))
    }
}

impl Filter for RenameFilter {
    fn transform(&self, readings: Vec<Reading>) -> Vec<Reading> {
        if self.asset.is_empty() {
            return readings;
        }
        readings
            .into_iter()
            .map(|mut reading| {
                reading.asset_code = self.asset.clone();
                reading
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        Self::PLUGIN
    }
}
