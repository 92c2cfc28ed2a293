// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Message types follow a struct-based pattern with a `Display` implementation
//! so log text lives in one place and every event carries structured fields.
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - platform, service and schedule lifecycle
//! * `messages::pipeline` - filter pipeline and category changes
//! * `messages::delivery` - egress outcomes and buffer discards
//!
//! # Usage
//!
//! ```rust
//! use the_northbound::observability::messages::delivery::BatchRejected;
//!
//! let msg = BatchRejected {
//!     service: "Archive",
//!     count: 10,
//!     reason: "payload too large",
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
