// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::ConfigCategory;
use crate::model::Reading;

/// Outcome of one attempt to hand a batch to a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResult {
    /// The sink accepted this many readings.
    Delivered(usize),
    /// The sink refused the batch for good; it is dropped and reported.
    Rejected(String),
    /// The sink could not take the batch right now; it will be retried.
    TransientFailure(String),
}

/// Boundary to an external sink.
///
/// `options` is the north service's category as it was when the current
/// cycle started, so a reconfiguration never changes a send in progress.
#[async_trait]
pub trait NorthConnector: Send + Sync {
    async fn send(&self, batch: &[Reading], options: &ConfigCategory) -> DeliveryResult;

    fn name(&self) -> &'static str;
}
