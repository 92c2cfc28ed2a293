// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::ingest::IngestHub;
use crate::engine::scheduler::Runnable;
use crate::traits::SouthSource;

/// A south service: polls its source once per cycle and ingests the result.
pub struct SouthService {
    name: String,
    plugin: String,
    options: BTreeMap<String, String>,
    source: Arc<dyn SouthSource>,
    hub: Arc<IngestHub>,
}

impl SouthService {
    pub fn new(
        name: impl Into<String>,
        plugin: impl Into<String>,
        options: BTreeMap<String, String>,
        source: Arc<dyn SouthSource>,
        hub: Arc<IngestHub>,
    ) -> Self {
        Self {
            name: name.into(),
            plugin: plugin.into(),
            options,
            source,
            hub,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Produce and ingest one round of readings; returns how many.
    pub async fn poll(&self) -> usize {
        let readings = self.source.produce().await;
        if readings.is_empty() {
            return 0;
        }
        self.hub.ingest(&self.name, &self.plugin, readings).await
    }
}

#[async_trait]
impl Runnable for SouthService {
    async fn run_once(&self) {
        let count = self.poll().await;
        tracing::trace!(service = %self.name, count, "Ingested readings");
    }
}
