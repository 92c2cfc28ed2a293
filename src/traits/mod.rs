// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod connector;
pub mod filter;
pub mod source;

pub use connector::{DeliveryResult, NorthConnector};
pub use filter::Filter;
pub use source::SouthSource;
