// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod plugin;
mod management;
mod storage;

pub use config::ConfigError;
pub use plugin::PluginError;
pub use management::{ManagementError, ManagementResult};
pub use storage::StorageError;
