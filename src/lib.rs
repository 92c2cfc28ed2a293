// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // source, filter and connector plugins
pub mod config;     // YAML config + categories
pub mod engine;     // buffers, pipelines, scheduler, platform
pub mod errors;     // error handling
pub mod model;      // readings
pub mod observability;
pub mod stats;      // counters + asset tracking
pub mod storage;    // persisted state
pub mod traits;     // plugin abstractions
