// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for filter pipeline and category reconfiguration.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The stage order of a north pipeline changed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_northbound::observability::messages::pipeline::PipelineUpdated;
///
/// let stages = vec!["MD1".to_string(), "SF1".to_string()];
/// let msg = PipelineUpdated {
///     service: "Archive",
///     stages: &stages,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineUpdated<'a> {
    pub service: &'a str,
    pub stages: &'a [String],
}

impl Display for PipelineUpdated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline for '{}' is now [{}]",
            self.service,
            self.stages.join(", ")
        )
    }
}

impl StructuredLog for PipelineUpdated<'_> {
    fn log(&self) {
        tracing::info!(
            service = self.service,
            stages = self.stages.join(","),
            stage_count = self.stages.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            service = self.service,
            stage_count = self.stages.len(),
        )
    }
}

/// A configuration category was updated.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CategoryUpdated<'a> {
    pub category: &'a str,
    pub keys: &'a [&'a str],
}

impl Display for CategoryUpdated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Category '{}' updated: {}",
            self.category,
            self.keys.join(", ")
        )
    }
}

impl StructuredLog for CategoryUpdated<'_> {
    fn log(&self) {
        tracing::info!(
            category = self.category,
            keys = self.keys.join(","),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("category", span_name = name, category = self.category)
    }
}

/// A category update was rejected.
///
/// # Log Level
/// `warn!` - Caller error, state unchanged
pub struct CategoryUpdateRejected<'a> {
    pub category: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CategoryUpdateRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected update of category '{}': {}", self.category, self.error)
    }
}

impl StructuredLog for CategoryUpdateRejected<'_> {
    fn log(&self) {
        tracing::warn!(category = self.category, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("category_rejected", span_name = name, category = self.category)
    }
}
