// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::Reading;

/// An in-flight transformation applied to readings before egress.
///
/// Filters are built from their configuration category by
/// [`FilterFactory`](crate::backends::FilterFactory) and are immutable: a
/// parameter change builds a new instance rather than mutating this one.
pub trait Filter: Send + Sync {
    /// Transform a batch. May drop, add or rewrite readings but must keep the
    /// relative order of the readings it passes on.
    fn transform(&self, readings: Vec<Reading>) -> Vec<Reading>;

    fn name(&self) -> &'static str;
}
