// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Restart-durable platform state.
//!
//! The platform snapshots its services, pipelines, category values, counters,
//! lineage records and undelivered readings into a [`PersistedState`] and
//! hands it to a [`StateStore`]. On start the stored state, when present,
//! replaces the service definitions from the configuration file.

mod state;
mod store;

pub use state::{
    PersistedFilter, PersistedNorth, PersistedSouth, PersistedStage, PersistedState,
    STATE_VERSION,
};
pub use store::{JsonFileStore, MemoryStore, StateStore};
