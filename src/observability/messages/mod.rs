// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it at its level with structured fields.
//!
//! # Organization
//!
//! * `engine` - platform, service and schedule lifecycle
//! * `pipeline` - filter pipeline and category reconfiguration
//! * `delivery` - north egress outcomes and buffer discards
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_northbound::observability::messages::StructuredLog;
//! use the_northbound::observability::messages::engine::ServiceAdded;
//!
//! let msg = ServiceAdded {
//!     service: "Archive",
//!     kind: "north",
//!     plugin: "capture",
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod delivery;
pub mod engine;
pub mod pipeline;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message at its level.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
