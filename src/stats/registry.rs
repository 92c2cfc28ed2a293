// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::config::consts::{STAT_ASSET_PREFIX, STAT_SERVICE_SENT_PREFIX};

/// Counter name holding the readings ingested for `asset`.
///
/// Asset codes are case-insensitive, so `pump` and `PUMP` share a counter.
pub fn asset_counter(asset: &str) -> String {
    format!("{}{}", STAT_ASSET_PREFIX, asset.to_uppercase())
}

/// Counter name holding the readings delivered by the north service `service`.
///
/// The prefixes keep per-asset, per-service and global counters apart, so no
/// asset code or service name can land on another counter.
pub fn service_sent_counter(service: &str) -> String {
    format!("{}{}", STAT_SERVICE_SENT_PREFIX, service)
}

/// Process-wide named counters.
///
/// Counters are created on first use and only ever grow, except through
/// [`StatisticsRegistry::reset`]. Increments of an existing counter take only
/// the read side of the index lock.
///
/// # Example
///
/// ```rust
/// use the_northbound::stats::StatisticsRegistry;
///
/// let stats = StatisticsRegistry::new();
/// stats.increment("READINGS", 3);
/// stats.increment("READINGS", 2);
///
/// assert_eq!(stats.get("READINGS"), 5);
/// assert_eq!(stats.get("DISCARDED"), 0);
/// ```
#[derive(Debug, Default)]
pub struct StatisticsRegistry {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `by` to the named counter, creating it at zero if needed.
    pub fn increment(&self, name: &str, by: u64) {
        if by == 0 {
            return;
        }
        self.counter(name).fetch_add(by, Ordering::Relaxed);
    }

    /// Current value, zero for a counter that was never touched.
    pub fn get(&self, name: &str) -> u64 {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Point-in-time copy of every counter, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        counters
            .iter()
            .map(|(name, c)| (name.clone(), c.load(Ordering::Relaxed)))
            .collect()
    }

    /// Load persisted values. A counter already higher than its persisted
    /// value keeps its own value so restored counters never move backwards.
    pub fn restore(&self, values: &BTreeMap<String, u64>) {
        for (name, value) in values {
            self.counter(name).fetch_max(*value, Ordering::Relaxed);
        }
    }

    /// Zero every counter. The only way a counter decreases.
    pub fn reset(&self) {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        for counter in counters.values() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn counter(&self, name: &str) -> Arc<AtomicU64> {
        {
            let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(counter) = counters.get(name) {
                return Arc::clone(counter);
            }
        }
        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            counters
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(AtomicU64::new(0))),
        )
    }
}
