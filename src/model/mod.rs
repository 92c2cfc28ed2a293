// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod reading;

pub use reading::{Batch, DatapointValue, Reading};
