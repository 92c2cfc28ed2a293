// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

/// Where in the flow an asset was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Ingest,
    Egress,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Ingest => write!(f, "Ingest"),
            EventKind::Egress => write!(f, "Egress"),
        }
    }
}

/// Lineage entry: the first time `service` handled `asset` for `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTrackingRecord {
    pub event: EventKind,
    pub service: String,
    pub asset: String,
    pub plugin: String,
    pub timestamp: DateTime<Utc>,
}

type TrackingKey = (EventKind, String, String);

/// Append-only lineage records keyed by (event, service, asset).
///
/// The first record for a key wins; later sightings leave it untouched.
#[derive(Debug, Default)]
pub struct AssetTracker {
    records: RwLock<BTreeMap<TrackingKey, AssetTrackingRecord>>,
}

impl AssetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting. Returns `true` when this created a new record.
    pub fn record(&self, event: EventKind, service: &str, asset: &str, plugin: &str) -> bool {
        let key = (event, service.to_string(), asset.to_string());
        {
            let records = self.records.read().unwrap_or_else(|e| e.into_inner());
            if records.contains_key(&key) {
                return false;
            }
        }

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records.contains_key(&key) {
            return false;
        }
        records.insert(
            key,
            AssetTrackingRecord {
                event,
                service: service.to_string(),
                asset: asset.to_string(),
                plugin: plugin.to_string(),
                timestamp: Utc::now(),
            },
        );
        true
    }

    /// Records matching every given filter; `None` matches anything.
    pub fn query(
        &self,
        event: Option<EventKind>,
        service: Option<&str>,
        asset: Option<&str>,
    ) -> Vec<AssetTrackingRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .values()
            .filter(|r| event.map_or(true, |e| r.event == e))
            .filter(|r| service.map_or(true, |s| r.service == s))
            .filter(|r| asset.map_or(true, |a| r.asset == a))
            .cloned()
            .collect()
    }

    pub fn records(&self) -> Vec<AssetTrackingRecord> {
        self.query(None, None, None)
    }

    /// Load persisted records, keeping any existing record for the same key.
    pub fn restore(&self, persisted: Vec<AssetTrackingRecord>) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        for record in persisted {
            let key = (record.event, record.service.clone(), record.asset.clone());
            records.entry(key).or_insert(record);
        }
    }
}
