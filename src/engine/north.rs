// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! North service egress cycle.
//!
//! One cycle drains up to `blockSize` readings, runs them through the
//! pipeline snapshot taken at batch start, and hands the result to the
//! connector together with the category snapshot taken at cycle start:
//!
//! - `Delivered(n)` adds `n` to `Readings Sent` and to the service's own
//!   counter and records an Egress lineage entry per asset
//! - `Rejected` drops the batch and counts it under `DISCARDED`
//! - `TransientFailure` is retried with backoff; when attempts run out the
//!   unfiltered batch goes back to the head of the buffer

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::consts::{
    BLOCK_SIZE_ITEM, DEFAULT_BLOCK_SIZE, STAT_DISCARDED, STAT_READINGS_SENT,
};
use crate::config::{ConfigCategory, ConfigItem};
use crate::engine::buffer::ReadingBuffer;
use crate::engine::pipeline::FilterPipeline;
use crate::engine::retry::RetryPolicy;
use crate::engine::scheduler::Runnable;
use crate::errors::ManagementResult;
use crate::model::Batch;
use crate::observability::messages::delivery::{
    BatchDelivered, BatchRejected, DeliveryExhausted, DeliveryRetrying,
};
use crate::observability::messages::StructuredLog;
use crate::stats::{service_sent_counter, AssetTracker, EventKind, StatisticsRegistry};
use crate::traits::{DeliveryResult, NorthConnector};

pub struct NorthService {
    name: String,
    plugin: String,
    connector: Arc<dyn NorthConnector>,
    category: RwLock<ConfigCategory>,
    pipeline: Arc<FilterPipeline>,
    buffer: Arc<ReadingBuffer>,
    stats: Arc<StatisticsRegistry>,
    tracker: Arc<AssetTracker>,
    retry: RetryPolicy,
    drain_wait: Duration,
}

/// What one egress cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The buffer stayed empty for the whole drain wait.
    Idle,
    /// Every reading was removed by the pipeline.
    Filtered(usize),
    Delivered(usize),
    Rejected(usize),
    /// Attempts ran out and the batch was put back.
    Requeued(usize),
}

impl NorthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        plugin: impl Into<String>,
        connector: Arc<dyn NorthConnector>,
        category: ConfigCategory,
        buffer: Arc<ReadingBuffer>,
        stats: Arc<StatisticsRegistry>,
        tracker: Arc<AssetTracker>,
        retry: RetryPolicy,
        drain_wait: Duration,
    ) -> Self {
        let name = name.into();
        Self {
            pipeline: Arc::new(FilterPipeline::new(name.clone())),
            name,
            plugin: plugin.into(),
            connector,
            category: RwLock::new(category),
            buffer,
            stats,
            tracker,
            retry,
            drain_wait,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn pipeline(&self) -> &Arc<FilterPipeline> {
        &self.pipeline
    }

    pub fn buffer(&self) -> &Arc<ReadingBuffer> {
        &self.buffer
    }

    pub async fn category(&self) -> ConfigCategory {
        self.category.read().await.clone()
    }

    /// Validate and apply connector option changes for the next cycle.
    pub async fn update_category(
        &self,
        changes: &BTreeMap<String, String>,
    ) -> ManagementResult<BTreeMap<String, ConfigItem>> {
        let mut category = self.category.write().await;
        let (updated, applied) = category.apply(changes)?;
        *category = updated;
        Ok(applied)
    }

    /// Run one egress cycle.
    pub async fn egress(&self) -> CycleOutcome {
        let options = self.category().await;
        let block_size = options
            .get_i64(BLOCK_SIZE_ITEM)
            .filter(|size| *size > 0)
            .map_or(DEFAULT_BLOCK_SIZE, |size| size as usize);

        let batch = self.buffer.drain_batch(block_size, self.drain_wait).await;
        if batch.is_empty() {
            return CycleOutcome::Idle;
        }

        let filtered = self.pipeline.apply(batch.clone()).await;
        if filtered.is_empty() {
            tracing::debug!(service = %self.name, count = batch.len(), "Pipeline removed every reading");
            return CycleOutcome::Filtered(batch.len());
        }

        self.deliver(batch, filtered, &options).await
    }

    async fn deliver(&self, original: Batch, filtered: Batch, options: &ConfigCategory) -> CycleOutcome {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.connector.send(&filtered, options).await {
                DeliveryResult::Delivered(count) => {
                    self.record_delivery(&filtered, count);
                    BatchDelivered {
                        service: &self.name,
                        count,
                        attempts: attempt,
                        duration: started.elapsed(),
                    }
                    .log();
                    return CycleOutcome::Delivered(count);
                }
                DeliveryResult::Rejected(reason) => {
                    self.stats.increment(STAT_DISCARDED, filtered.len() as u64);
                    BatchRejected {
                        service: &self.name,
                        count: filtered.len(),
                        reason: &reason,
                    }
                    .log();
                    return CycleOutcome::Rejected(filtered.len());
                }
                DeliveryResult::TransientFailure(reason) => {
                    if attempt >= self.retry.max_attempts() {
                        let count = original.len();
                        let lost = self.buffer.requeue_front(original).await;
                        self.stats.increment(STAT_DISCARDED, lost as u64);
                        DeliveryExhausted {
                            service: &self.name,
                            count,
                            attempts: attempt,
                            reason: &reason,
                        }
                        .log();
                        return CycleOutcome::Requeued(count);
                    }

                    let backoff = self.retry.backoff(attempt);
                    DeliveryRetrying {
                        service: &self.name,
                        attempt,
                        max_attempts: self.retry.max_attempts(),
                        backoff,
                        reason: &reason,
                    }
                    .log();
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    fn record_delivery(&self, delivered: &Batch, count: usize) {
        self.stats.increment(STAT_READINGS_SENT, count as u64);
        self.stats.increment(&service_sent_counter(&self.name), count as u64);

        let assets: BTreeSet<&str> = delivered.iter().map(|r| r.asset_code.as_str()).collect();
        for asset in assets {
            self.tracker
                .record(EventKind::Egress, &self.name, asset, &self.plugin);
        }
    }
}

#[async_trait]
impl Runnable for NorthService {
    async fn run_once(&self) {
        self.egress().await;
    }
}
