// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::config::{ConfigCategory, ConfigItem, ItemType};
use crate::model::Reading;
use crate::traits::{DeliveryResult, NorthConnector};

/// Readings delivered by capture connectors, keyed by north service name.
#[derive(Clone, Default)]
pub struct CaptureSink {
    delivered: Arc<Mutex<BTreeMap<String, Vec<Vec<Reading>>>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every reading delivered for `service`, in delivery order.
    pub fn readings(&self, service: &str) -> Vec<Reading> {
        self.batches(service).into_iter().flatten().collect()
    }

    pub fn batches(&self, service: &str) -> Vec<Vec<Reading>> {
        self.lock().get(service).cloned().unwrap_or_default()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, service: &str, batch: &[Reading]) {
        self.lock()
            .entry(service.to_string())
            .or_default()
            .push(batch.to_vec());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Vec<Reading>>>> {
        self.delivered.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Capture connector - keeps delivered batches in a [`CaptureSink`]
///
/// The `failMode` item makes every send fail the chosen way, which lets a
/// north service exercise its retry and rejection handling.
pub struct CaptureConnector {
    sink: CaptureSink,
}

impl CaptureConnector {
    pub const PLUGIN: &'static str = "capture";

    pub fn new(sink: CaptureSink) -> Self {
        Self { sink }
    }

    pub fn schema(category: ConfigCategory) -> ConfigCategory {
        category.with_item(
            "failMode",
            ConfigItem::new(
                ItemType::Enumeration {
                    options: vec!["none".into(), "transient".into(), "reject".into()],
                },
                "Simulated sink failure",
                "none",
            ),
        )
    }
}

#[async_trait]
impl NorthConnector for CaptureConnector {
    async fn send(&self, batch: &[Reading], options: &ConfigCategory) -> DeliveryResult {
        match options.get("failMode").unwrap_or("none") {
            "transient" => DeliveryResult::TransientFailure("capture sink unavailable".to_string()),
            "reject" => DeliveryResult::Rejected("capture sink refused the batch".to_string()),
            _ => {
                self.sink.record(&options.name, batch);
                DeliveryResult::Delivered(batch.len())
            }
        }
    }

    fn name(&self) -> &'static str {
        Self::PLUGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(fail_mode: &str) -> ConfigCategory {
        let category = CaptureConnector::schema(ConfigCategory::new("Archive", "test"));
        category
            .apply(&BTreeMap::from([("failMode".to_string(), fail_mode.to_string())]))
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn test_delivers_into_sink_by_service() {
        let sink = CaptureSink::new();
        let connector = CaptureConnector::new(sink.clone());
        let batch = vec![Reading::new("a", "s"), Reading::new("b", "s")];

        let result = connector.send(&batch, &options("none")).await;

        assert_eq!(result, DeliveryResult::Delivered(2));
        assert_eq!(sink.readings("Archive"), batch);
        assert!(sink.readings("Other").is_empty());
    }

    #[tokio::test]
    async fn test_fail_modes() {
        let sink = CaptureSink::new();
        let connector = CaptureConnector::new(sink.clone());
        let batch = vec![Reading::new("a", "s")];

        assert!(matches!(
            connector.send(&batch, &options("transient")).await,
            DeliveryResult::TransientFailure(_)
        ));
        assert!(matches!(
            connector.send(&batch, &options("reject")).await,
            DeliveryResult::Rejected(_)
        ));
        assert!(sink.batches("Archive").is_empty());
    }
}
