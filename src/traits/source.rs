// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::model::Reading;

/// A south-side data source polled on the service's cadence.
#[async_trait]
pub trait SouthSource: Send + Sync {
    /// Produce the readings available right now, possibly none.
    async fn produce(&self) -> Vec<Reading>;

    fn name(&self) -> &'static str;
}
