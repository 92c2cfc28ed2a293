// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::errors::PluginError;
use crate::model::{DatapointValue, Reading};
use crate::traits::Filter;

/// Metadata filter - adds a fixed set of datapoints to every reading
///
/// The `config` item is a JSON object; each scalar member becomes a
/// datapoint. Existing datapoints with the same name are overwritten.
pub struct MetadataFilter {
    datapoints: BTreeMap<String, DatapointValue>,
}

impl MetadataFilter {
    pub const PLUGIN: &'static str = "metadata";

    pub fn new(datapoints: BTreeMap<String, DatapointValue>) -> Self {
        Self { datapoints }
    }

    pub fn schema(category: ConfigCategory) -> ConfigCategory {
        category.with_item(
            "config",
            ConfigItem::new(ItemType::Json, "Datapoints to add to each reading", r#"{"value": "metadata"}"#),
        )
    }

    pub fn from_category(category: &ConfigCategory) -> Result<Self, PluginError> {
        let invalid = |reason: String| PluginError::InvalidOption {
            plugin: Self::PLUGIN.to_string(),
            key: "config".to_string(),
            reason,
        };

        let raw = category.get("config").unwrap_or("{}");
        let parsed: serde_json::Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
        let object = parsed
            .as_object()
            .ok_or_else(|| invalid("expected a JSON object".to_string()))?;

        let mut datapoints = BTreeMap::new();
        for (name, value) in object {
            let value = DatapointValue::from_json(value)
                .ok_or_else(|| invalid(format!("'{}' is not a scalar", name)))?;
            datapoints.insert(name.clone(), value);
        }
        Ok(Self::new(datapoints))
    }
}

impl Filter for MetadataFilter {
    fn transform(&self, readings: Vec<Reading>) -> Vec<Reading> {
        readings
            .into_iter()
            .map(|mut reading| {
                for (name, value) in &self.datapoints {
                    reading.datapoints.insert(name.clone(), value.clone());
                }
                reading
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        Self::PLUGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(config: &str) -> ConfigCategory {
        let base = MetadataFilter::schema(ConfigCategory::new("metadata", "test"));
        base.apply(&[("config".to_string(), config.to_string())].into_iter().collect())
            .unwrap()
            .0
    }

    #[test]
    fn test_adds_configured_datapoints() {
        let filter = MetadataFilter::from_category(&category(r#"{"site": "north", "line": 4}"#)).unwrap();
        let output = filter.transform(vec![
            Reading::new("pump", "south").with_datapoint("speed", DatapointValue::Integer(10)),
        ]);

        assert_eq!(output[0].datapoints.len(), 3);
        assert_eq!(
            output[0].datapoint("site"),
            Some(&DatapointValue::String("north".into()))
        );
        assert_eq!(output[0].datapoint("line"), Some(&DatapointValue::Integer(4)));
    }

    #[test]
    fn test_rejects_non_object_config() {
        let result = MetadataFilter::from_category(&category("[1, 2]"));
        assert!(matches!(result, Err(PluginError::InvalidOption { key, .. }) if key == "config"));
    }

    #[test]
    fn test_rejects_nested_values() {
        let result = MetadataFilter::from_category(&category(r#"{"nested": {"a": 1}}"#));
        assert!(result.is_err());
    }
}
