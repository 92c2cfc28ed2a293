// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod category;
mod loader;
mod validation;

pub mod consts;

pub use category::{ConfigCategory, ConfigItem, ItemType};
pub use loader::{
    interval_or_default, load_and_validate_config, load_config, option_strings, BufferConfig,
    DeliveryConfig, FilterConfig, NorthServiceConfig, PlatformConfig, SouthServiceConfig,
    StorageConfig,
};
pub use validation::validate_config;
