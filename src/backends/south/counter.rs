// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::errors::PluginError;
use crate::model::{DatapointValue, Reading};
use crate::traits::SouthSource;

/// Configuration for the counter source
#[derive(Debug, Clone, PartialEq)]
pub struct CounterConfig {
    pub asset: String,
    pub step: i64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            asset: "counter".to_string(),
            step: 1,
        }
    }
}

/// Counter source - one reading per run whose `value` grows by `step`
///
/// The first reading carries `step`, the next `2 * step` and so on.
pub struct CounterSource {
    service: String,
    config: CounterConfig,
    current: AtomicI64,
}

impl CounterSource {
    pub const PLUGIN: &'static str = "counter";

    pub fn new(service: impl Into<String>, config: CounterConfig) -> Self {
        Self {
            service: service.into(),
            config,
            current: AtomicI64::new(0),
        }
    }

    /// Build from the string options of a south service.
    pub fn from_options(service: &str, options: &BTreeMap<String, String>) -> Result<Self, PluginError> {
        let mut config = CounterConfig::default();
        for (key, value) in options {
            match key.as_str() {
                "asset" if !value.trim().is_empty() => config.asset = value.trim().to_string(),
                "asset" => {}
                "step" => {
                    config.step = value.trim().parse().map_err(|_| PluginError::InvalidOption {
                        plugin: Self::PLUGIN.to_string(),
                        key: key.clone(),
                        reason: format!("'{}' is not an integer", value),
                    })?
                }
                _ => {
                    return Err(PluginError::InvalidOption {
                        plugin: Self::PLUGIN.to_string(),
                        key: key.clone(),
                        reason: "unknown option".to_string(),
                    })
                }
            }
        }
        Ok(Self::new(service, config))
    }
}

#[async_trait]
impl SouthSource for CounterSource {
    async fn produce(&self) -> Vec<Reading> {
        let value = self.current.fetch_add(self.config.step, Ordering::Relaxed) + self.config.step;
        vec![Reading::new(&self.config.asset, &self.service)
            .with_datapoint("value", DatapointValue::Integer(value))]
    }

    fn name(&self) -> &'static str {
        Self::PLUGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_produces_incrementing_values() {
        let source = CounterSource::new(
            "Counter #1",
            CounterConfig {
                asset: "pump".into(),
                step: 5,
            },
        );

        let first = source.produce().await;
        let second = source.produce().await;

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].asset_code, "pump");
        assert_eq!(first[0].origin, "Counter #1");
        assert_eq!(first[0].datapoint("value"), Some(&DatapointValue::Integer(5)));
        assert_eq!(second[0].datapoint("value"), Some(&DatapointValue::Integer(10)));
    }

    #[test]
    fn test_from_options_validates() {
        let options = BTreeMap::from([("step".to_string(), "two".to_string())]);
        assert!(CounterSource::from_options("s", &options).is_err());

        let options = BTreeMap::from([("colour".to_string(), "red".to_string())]);
        assert!(CounterSource::from_options("s", &options).is_err());

        let options = BTreeMap::from([("asset".to_string(), "tank".to_string())]);
        let source = CounterSource::from_options("s", &options).unwrap();
        assert_eq!(source.config.asset, "tank");
        assert_eq!(source.config.step, 1);
    }
}
