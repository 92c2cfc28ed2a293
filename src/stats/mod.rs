// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Statistics counters and asset lineage tracking shared by every service.

mod asset_tracker;
mod registry;

pub use asset_tracker::{AssetTracker, AssetTrackingRecord, EventKind};
pub use registry::{asset_counter, service_sent_counter, StatisticsRegistry};
