// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::model::Reading;
use crate::traits::{DeliveryResult, NorthConnector};

/// Log connector - writes a summary of each batch through `tracing`
///
/// Setting `verbose` adds one debug line per reading.
pub struct LogConnector;

impl LogConnector {
    pub const PLUGIN: &'static str = "log";

    pub fn schema(category: ConfigCategory) -> ConfigCategory {
        category.with_item(
            "verbose",
            ConfigItem::new(ItemType::Boolean, "Log every reading", "false"),
        )
    }
}

#[async_trait]
impl NorthConnector for LogConnector {
    async fn send(&self, batch: &[Reading], options: &ConfigCategory) -> DeliveryResult {
        let assets: BTreeSet<&str> = batch.iter().map(|r| r.asset_code.as_str()).collect();
        tracing::info!(
            service = %options.name,
            count = batch.len(),
            assets = ?assets,
            "Forwarded {} readings", batch.len()
        );

        if options.get_bool("verbose").unwrap_or(false) {
            for reading in batch {
                tracing::debug!(
                    service = %options.name,
                    asset = %reading.asset_code,
                    timestamp = %reading.timestamp,
                    datapoints = ?reading.datapoints,
                    "Reading"
                );
            }
        }

        DeliveryResult::Delivered(batch.len())
    }

    fn name(&self) -> &'static str {
        Self::PLUGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn options(verbose: &str) -> ConfigCategory {
        LogConnector::schema(ConfigCategory::new("Console", "test"))
            .apply(&BTreeMap::from([("verbose".to_string(), verbose.to_string())]))
            .unwrap()
            .0
    }

    #[test]
    fn test_schema_defaults_to_quiet() {
        let category = LogConnector::schema(ConfigCategory::new("Console", "test"));
        assert_eq!(category.get_bool("verbose"), Some(false));
    }

    #[tokio::test]
    async fn test_delivers_whole_batch_in_either_mode() {
        let batch = vec![
            Reading::new("pump", "s"),
            Reading::new("valve", "s"),
            Reading::new("pump", "s"),
        ];

        for verbose in ["false", "TRUE"] {
            let result = LogConnector.send(&batch, &options(verbose)).await;
            assert_eq!(result, DeliveryResult::Delivered(3));
        }
        assert_eq!(
            LogConnector.send(&[], &options("true")).await,
            DeliveryResult::Delivered(0)
        );
    }

    #[test]
    fn test_verbose_must_be_boolean() {
        let category = LogConnector::schema(ConfigCategory::new("Console", "test"));
        let result = category.apply(&BTreeMap::from([("verbose".to_string(), "loud".to_string())]));
        assert!(result.is_err());
    }
}
