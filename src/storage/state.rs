// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::model::Reading;
use crate::stats::AssetTrackingRecord;

pub const STATE_VERSION: u32 = 1;

/// Everything the platform needs to come back exactly as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub south: Vec<PersistedSouth>,
    #[serde(default)]
    pub filters: Vec<PersistedFilter>,
    #[serde(default)]
    pub north: Vec<PersistedNorth>,
    #[serde(default)]
    pub statistics: BTreeMap<String, u64>,
    #[serde(default)]
    pub asset_tracking: Vec<AssetTrackingRecord>,
}

impl PersistedState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            saved_at: Utc::now(),
            south: Vec::new(),
            filters: Vec::new(),
            north: Vec::new(),
            statistics: BTreeMap::new(),
            asset_tracking: Vec::new(),
        }
    }

    /// Readings still waiting in north buffers.
    pub fn pending_readings(&self) -> usize {
        self.north.iter().map(|n| n.pending.len()).sum()
    }
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSouth {
    pub name: String,
    pub plugin: String,
    pub schedule_id: Uuid,
    pub enabled: bool,
    pub interval_ms: u64,
    pub options: BTreeMap<String, String>,
}

/// A filter definition and its configured values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedFilter {
    pub name: String,
    pub plugin: String,
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNorth {
    pub name: String,
    pub plugin: String,
    pub schedule_id: Uuid,
    pub enabled: bool,
    pub interval_ms: u64,
    /// Connector category values.
    pub values: BTreeMap<String, String>,
    /// Stages in pipeline order.
    pub pipeline: Vec<PersistedStage>,
    /// Buffered readings not yet delivered, oldest first.
    #[serde(default)]
    pub pending: Vec<Reading>,
}

/// One pipeline stage with its per-service category values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStage {
    pub name: String,
    pub values: BTreeMap<String, String>,
}
