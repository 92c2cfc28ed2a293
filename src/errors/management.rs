// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors returned by reconfiguration and management operations.
//!
//! Every operation that returns one of these leaves the platform exactly as it
//! was before the call.

use crate::errors::{PluginError, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagementError {
    /// Malformed input: unknown keys, bad values, non-permutation reorders.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The named service, schedule, filter, stage or category does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// A name collision or an operation blocked by existing usage.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The change was rejected by the plugin it targets.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Persisting the change failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ManagementError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        ManagementError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Result type alias for management operations.
pub type ManagementResult<T> = Result<T, ManagementError>;
