// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plugin backends for The Northbound data pipeline.
//!
//! Each plugin kind has a factory keyed by plugin name, so services and
//! filters are selected by configuration rather than by code.
//!
//! # Available Plugins
//!
//! ## South
//! - **counter**: one reading per run with an incrementing `value`
//!
//! ## Filters
//! - **scale**: `value * factor + offset` on numeric datapoints
//! - **metadata**: adds fixed datapoints from a JSON object
//! - **rename**: replaces the asset code
//!
//! ## North
//! - **capture**: in-memory sink with simulated failures
//! - **log**: writes batches to the log
//! - **http_json**: JSON over an abstract [`north::Transport`] with Basic auth
//!
//! # Architecture
//!
//! ```text
//! Plugin name + category → Factory → Arc<dyn Filter | NorthConnector | SouthSource>
//! ```
//!
//! # Example
//! ```rust
//! use the_northbound::backends::FilterFactory;
//!
//! let category = FilterFactory::category("scale")?;
//! let filter = FilterFactory::create("scale", &category)?;
//! assert_eq!(filter.name(), "scale");
//! # Ok::<(), the_northbound::errors::PluginError>(())
//! ```

pub mod filters;
pub mod north;
pub mod south;

pub use filters::FilterFactory;
pub use north::ConnectorFactory;
pub use south::SourceFactory;
