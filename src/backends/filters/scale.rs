// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::errors::PluginError;
use crate::model::{DatapointValue, Reading};
use crate::traits::Filter;

/// Configuration for the scale filter
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    pub factor: f64,
    pub offset: f64,
}

/// Scale filter - numeric datapoints become `value * factor + offset`
///
/// String datapoints pass through untouched. Integers come out as floats.
pub struct ScaleFilter {
    config: ScaleConfig,
}

impl ScaleFilter {
    pub const PLUGIN: &'static str = "scale";

    pub fn new(config: ScaleConfig) -> Self {
        Self { config }
    }

    pub fn schema(category: ConfigCategory) -> ConfigCategory {
        category
            .with_item("factor", ConfigItem::new(ItemType::Float, "Scale factor", "100.0"))
            .with_item("offset", ConfigItem::new(ItemType::Float, "Constant added after scaling", "0.0"))
    }

    pub fn from_category(category: &ConfigCategory) -> Result<Self, PluginError> {
        let read = |key: &str| {
            category.get_f64(key).ok_or_else(|| PluginError::InvalidOption {
                plugin: Self::PLUGIN.to_string(),
                key: key.to_string(),
                reason: "expected a number".to_string(),
            })
        };
        Ok(Self::new(ScaleConfig {
            factor: read("factor")?,
            offset: read("offset")?,
        }))
    }
}

impl Filter for ScaleFilter {
    fn transform(&self, readings: Vec<Reading>) -> Vec<Reading> {
        readings
            .into_iter()
            .map(|mut reading| {
                for value in reading.datapoints.values_mut() {
                    if let Some(number) = value.as_f64() {
                        *value = DatapointValue::Float(number * self.config.factor + self.config.offset);
                    }
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

    #[test]
    fn test_scales_numbers_and_skips_strings() {
        let filter = ScaleFilter::new(ScaleConfig {
            factor: 2.0,
            offset: 1.0,
        });
        let input = vec![Reading::new("pump", "south")
            .with_datapoint("speed", DatapointValue::Integer(10))
            .with_datapoint("temp", DatapointValue::Float(1.5))
            .with_datapoint("state", DatapointValue::String("on".into()))];

        let output = filter.transform(input);

        assert_eq!(output[0].datapoint("speed"), Some(&DatapointValue::Float(21.0)));
        assert_eq!(output[0].datapoint("temp"), Some(&DatapointValue::Float(4.0)));
        assert_eq!(
            output[0].datapoint("state"),
            Some(&DatapointValue::String("on".into()))
        );
    }

    #[test]
    fn test_from_category_uses_current_values() {
        let base = ConfigCategory::new("scale", "test");
        let (category, _) = ScaleFilter::schema(base)
            .apply(&[("factor".to_string(), "3".to_string())].into_iter().collect())
            .unwrap();

        let filter = ScaleFilter::from_category(&category).unwrap();
        assert_eq!(filter.config, ScaleConfig { factor: 3.0, offset: 0.0 });
    }
}
