// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while loading or saving persisted platform state.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("State store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
