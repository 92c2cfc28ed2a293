// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::consts::{STAT_DISCARDED, STAT_READINGS};
use crate::engine::buffer::ReadingBuffer;
use crate::model::Reading;
use crate::observability::messages::delivery::ReadingsDiscarded;
use crate::observability::messages::StructuredLog;
use crate::stats::{asset_counter, AssetTracker, EventKind, StatisticsRegistry};

/// Entry point for readings produced by south services.
///
/// Every ingested reading is counted under `READINGS` and its asset
/// counter, gets an Ingest lineage record, and is pushed into the buffer
/// of every attached north service.
pub struct IngestHub {
    buffers: RwLock<BTreeMap<String, Arc<ReadingBuffer>>>,
    stats: Arc<StatisticsRegistry>,
    tracker: Arc<AssetTracker>,
}

impl IngestHub {
    pub fn new(stats: Arc<StatisticsRegistry>, tracker: Arc<AssetTracker>) -> Self {
        Self {
            buffers: RwLock::new(BTreeMap::new()),
            stats,
            tracker,
        }
    }

    /// Start feeding `buffer` on behalf of north service `service`.
    pub async fn attach(&self, service: &str, buffer: Arc<ReadingBuffer>) {
        self.buffers.write().await.insert(service.to_string(), buffer);
    }

    /// Stop feeding north service `service` and hand back its buffer.
    pub async fn detach(&self, service: &str) -> Option<Arc<ReadingBuffer>> {
        self.buffers.write().await.remove(service)
    }

    pub async fn attached(&self) -> Vec<String> {
        self.buffers.read().await.keys().cloned().collect()
    }

    /// Ingest readings produced by south service `service` using `plugin`.
    ///
    /// Returns the number of readings accepted for counting.
    pub async fn ingest(&self, service: &str, plugin: &str, readings: Vec<Reading>) -> usize {
        let buffers: Vec<(String, Arc<ReadingBuffer>)> = self
            .buffers
            .read()
            .await
            .iter()
            .map(|(name, buffer)| (name.clone(), Arc::clone(buffer)))
            .collect();

        let count = readings.len();
        let mut discarded: BTreeMap<&str, usize> = BTreeMap::new();

        for reading in readings {
            self.stats.increment(STAT_READINGS, 1);
            self.stats.increment(&asset_counter(&reading.asset_code), 1);
            self.tracker
                .record(EventKind::Ingest, service, &reading.asset_code, plugin);

            for (name, buffer) in &buffers {
                let outcome = buffer.push(reading.clone()).await;
                if outcome.discarded() > 0 {
                    *discarded.entry(name.as_str()).or_default() += outcome.discarded();
                }
            }
        }

        for (name, lost) in discarded {
            self.stats.increment(STAT_DISCARDED, lost as u64);
            if let Some((_, buffer)) = buffers.iter().find(|(n, _)| n == name) {
                ReadingsDiscarded {
                    service: name,
                    count: lost,
                    policy: &buffer.policy().to_string(),
                }
                .log();
            }
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::OverflowPolicy;
    use crate::model::DatapointValue;
    use std::time::Duration;

    fn hub() -> (IngestHub, Arc<StatisticsRegistry>, Arc<AssetTracker>) {
        let stats = Arc::new(StatisticsRegistry::new());
        let tracker = Arc::new(AssetTracker::new());
        (IngestHub::new(Arc::clone(&stats), Arc::clone(&tracker)), stats, tracker)
    }

    fn readings(asset: &str, n: i64) -> Vec<Reading> {
        (0..n)
            .map(|i| Reading::new(asset, "Counter #1").with_datapoint("value", DatapointValue::Integer(i)))
            .collect()
    }

    #[tokio::test]
    async fn test_fans_out_to_every_north_buffer() {
        let (hub, stats, tracker) = hub();
        let a = Arc::new(ReadingBuffer::new(100, OverflowPolicy::DropOldest));
        let b = Arc::new(ReadingBuffer::new(100, OverflowPolicy::DropOldest));
        hub.attach("A", Arc::clone(&a)).await;
        hub.attach("B", Arc::clone(&b)).await;

        assert_eq!(hub.ingest("Counter #1", "counter", readings("pump", 3)).await, 3);

        assert_eq!(a.len().await, 3);
        assert_eq!(b.len().await, 3);
        assert_eq!(stats.get(STAT_READINGS), 3);
        assert_eq!(stats.get(&asset_counter("pump")), 3);
        let records = tracker.query(Some(EventKind::Ingest), Some("Counter #1"), Some("pump"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].plugin, "counter");
    }

    #[tokio::test]
    async fn test_counts_without_north_services() {
        let (hub, stats, _) = hub();
        hub.ingest("Counter #1", "counter", readings("pump", 2)).await;
        assert_eq!(stats.get(STAT_READINGS), 2);
    }

    #[tokio::test]
    async fn test_overflow_is_counted_as_discarded() {
        let (hub, stats, _) = hub();
        let small = Arc::new(ReadingBuffer::new(2, OverflowPolicy::RejectNewest));
        hub.attach("A", Arc::clone(&small)).await;

        hub.ingest("Counter #1", "counter", readings("pump", 5)).await;

        assert_eq!(stats.get(STAT_READINGS), 5);
        assert_eq!(stats.get(STAT_DISCARDED), 3);
        let kept = small.drain_batch(10, Duration::from_millis(10)).await;
        assert_eq!(kept[0].datapoint("value"), Some(&DatapointValue::Integer(0)));
    }

    #[tokio::test]
    async fn test_detach_stops_feeding() {
        let (hub, _, _) = hub();
        let a = Arc::new(ReadingBuffer::new(10, OverflowPolicy::DropOldest));
        hub.attach("A", Arc::clone(&a)).await;
        assert!(hub.detach("A").await.is_some());
        assert!(hub.attached().await.is_empty());

        hub.ingest("Counter #1", "counter", readings("pump", 2)).await;
        assert!(a.is_empty().await);
    }
}
