// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default number of readings each north buffer can hold
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;
/// Default maximum readings drained per north cycle
pub const DEFAULT_BLOCK_SIZE: usize = 500;
/// Default time a north cycle waits for readings when its buffer is empty
pub const DEFAULT_DRAIN_WAIT_MS: u64 = 250;
/// Default cadence of south and north tasks
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
/// Default send attempts per cycle before a batch is requeued
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry of a transient failure
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;
/// Upper bound on the retry delay
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 2_000;
/// Default period of the background state flush
pub const DEFAULT_PERSIST_INTERVAL_MS: u64 = 5_000;

/// Counter incremented for every ingested reading
pub const STAT_READINGS: &str = "READINGS";
/// Counter incremented for every delivered reading
pub const STAT_READINGS_SENT: &str = "Readings Sent";
/// Counter incremented for every reading lost to overflow or rejection
pub const STAT_DISCARDED: &str = "DISCARDED";
/// Prefix of the per-asset read counters, followed by the upper-case asset code
pub const STAT_ASSET_PREFIX: &str = "Asset ";
/// Prefix of the per-north-service sent counters, followed by the service name
pub const STAT_SERVICE_SENT_PREFIX: &str = "Readings Sent ";

/// Category item holding the plugin name of a service or filter
pub const PLUGIN_ITEM: &str = "plugin";
/// Category item toggling a filter stage
pub const ENABLE_ITEM: &str = "enable";
/// North category item bounding the readings sent per cycle
pub const BLOCK_SIZE_ITEM: &str = "blockSize";
