// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ordered, live-reconfigurable filter pipeline of a north service.
//!
//! # Snapshot Discipline
//!
//! The stage list is an immutable `Arc<Vec<Arc<FilterStage>>>`. A batch clones
//! the `Arc` when it starts and runs against that snapshot to completion.
//! Every change builds a new list and swaps it in under the write lock:
//!
//! ```text
//! batch N   ── snapshot v1 ──▶ [MD1, SF1] ──▶ connector
//! reorder   ──────── write lock: v2 = [SF1, MD1] ────────
//! batch N+1 ── snapshot v2 ──▶ [SF1, MD1] ──▶ connector
//! ```
//!
//! No batch ever sees a half-applied change and writers never wait for a
//! running batch, only for the instant it takes to clone the `Arc`.
//!
//! # Stages
//!
//! A [`FilterStage`] is immutable too. Its parameters live in a category named
//! `<service>_<stage>`; changing a parameter builds a fresh filter from the
//! updated category and replaces the stage. A stage whose `enable` item is
//! false is a pass-through that keeps its position.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backends::FilterFactory;
use crate::config::consts::ENABLE_ITEM;
use crate::config::{ConfigCategory, ConfigItem};
use crate::errors::{ManagementError, ManagementResult, PluginError};
use crate::model::Batch;
use crate::traits::Filter;

/// Category name of a stage inside a service's pipeline.
pub fn stage_category_name(service: &str, stage: &str) -> String {
    format!("{}_{}", service, stage)
}

pub struct FilterStage {
    name: String,
    plugin: String,
    category: ConfigCategory,
    filter: Arc<dyn Filter>,
}

impl FilterStage {
    pub fn new(
        name: impl Into<String>,
        plugin: impl Into<String>,
        category: ConfigCategory,
        filter: Arc<dyn Filter>,
    ) -> Self {
        Self {
            name: name.into(),
            plugin: plugin.into(),
            category,
            filter,
        }
    }

    /// Build the stage `name` of `service` from a filter definition's category.
    pub fn build(
        service: &str,
        name: &str,
        plugin: &str,
        definition: &ConfigCategory,
    ) -> Result<Self, PluginError> {
        let category = definition.clone().renamed(stage_category_name(service, name));
        let filter = FilterFactory::create(plugin, &category)?;
        Ok(Self::new(name, plugin, category, filter))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn category(&self) -> &ConfigCategory {
        &self.category
    }

    pub fn enabled(&self) -> bool {
        self.category.get_bool(ENABLE_ITEM).unwrap_or(true)
    }

    /// A new stage with `changes` applied. The filter is rebuilt unless only
    /// the `enable` item changed.
    fn reconfigured(
        &self,
        changes: &BTreeMap<String, String>,
    ) -> ManagementResult<(FilterStage, BTreeMap<String, ConfigItem>)> {
        let (category, applied) = self.category.apply(changes)?;
        let filter = if changes.keys().all(|key| key == ENABLE_ITEM) {
            Arc::clone(&self.filter)
        } else {
            FilterFactory::create(&self.plugin, &category)?
        };
        Ok((
            FilterStage::new(self.name.clone(), self.plugin.clone(), category, filter),
            applied,
        ))
    }
}

/// Read-only view of a stage and its position.
#[derive(Debug, Clone, PartialEq)]
pub struct StageInfo {
    pub name: String,
    pub plugin: String,
    pub ordinal: usize,
    pub enabled: bool,
}

pub type StageList = Arc<Vec<Arc<FilterStage>>>;

/// Run `batch` through `stages` in order, skipping disabled stages.
pub fn apply_stages(stages: &[Arc<FilterStage>], batch: Batch) -> Batch {
    stages.iter().fold(batch, |batch, stage| {
        if stage.enabled() && !batch.is_empty() {
            stage.filter.transform(batch)
        } else {
            batch
        }
    })
}

pub struct FilterPipeline {
    service: String,
    stages: RwLock<StageList>,
}

impl FilterPipeline {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            stages: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// The stage list a batch starting now would run against.
    pub async fn snapshot(&self) -> StageList {
        Arc::clone(&*self.stages.read().await)
    }

    pub async fn apply(&self, batch: Batch) -> Batch {
        let stages = self.snapshot().await;
        apply_stages(&stages, batch)
    }

    pub async fn names(&self) -> Vec<String> {
        self.snapshot()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    pub async fn stages(&self) -> Vec<StageInfo> {
        self.snapshot()
            .await
            .iter()
            .enumerate()
            .map(|(ordinal, s)| StageInfo {
                name: s.name.clone(),
                plugin: s.plugin.clone(),
                ordinal,
                enabled: s.enabled(),
            })
            .collect()
    }

    pub async fn stage(&self, name: &str) -> Option<Arc<FilterStage>> {
        self.snapshot()
            .await
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.stage(name).await.is_some()
    }

    /// Insert `stage` at `position` (clamped to the end, `None` appends) and
    /// return its ordinal.
    ///
    /// A stage with the same name already present is a `Conflict` unless
    /// `allow_duplicates` is set, in which case the pipeline is left as is
    /// and the existing ordinal is returned.
    pub async fn insert(
        &self,
        stage: FilterStage,
        position: Option<usize>,
        allow_duplicates: bool,
    ) -> ManagementResult<usize> {
        let mut guard = self.stages.write().await;
        if let Some(existing) = guard.iter().position(|s| s.name == stage.name) {
            if allow_duplicates {
                return Ok(existing);
            }
            return Err(ManagementError::Conflict(format!(
                "filter '{}' is already in the pipeline of '{}'",
                stage.name, self.service
            )));
        }

        let mut next = (**guard).clone();
        let ordinal = position.unwrap_or(next.len()).min(next.len());
        next.insert(ordinal, Arc::new(stage));
        *guard = Arc::new(next);
        Ok(ordinal)
    }

    pub async fn remove(&self, name: &str) -> ManagementResult<Arc<FilterStage>> {
        let mut guard = self.stages.write().await;
        let index = guard
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| self.missing(name))?;

        let mut next = (**guard).clone();
        let removed = next.remove(index);
        *guard = Arc::new(next);
        Ok(removed)
    }

    /// Replace the order with `names`, which must be a permutation of the
    /// current stage names.
    pub async fn reorder(&self, names: &[String]) -> ManagementResult<()> {
        let mut guard = self.stages.write().await;

        let unique: HashSet<&str> = names.iter().map(String::as_str).collect();
        let is_permutation = names.len() == guard.len()
            && unique.len() == names.len()
            && guard.iter().all(|s| unique.contains(s.name.as_str()));
        if !is_permutation {
            return Err(ManagementError::Validation(format!(
                "[{}] is not a permutation of the pipeline of '{}' [{}]",
                names.join(", "),
                self.service,
                guard.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }

        let mut next = Vec::with_capacity(names.len());
        for name in names {
            if let Some(stage) = guard.iter().find(|s| &s.name == name) {
                next.push(Arc::clone(stage));
            }
        }
        *guard = Arc::new(next);
        Ok(())
    }

    /// Swap in a complete stage list. Names must already be unique.
    pub async fn replace(&self, stages: Vec<Arc<FilterStage>>) {
        *self.stages.write().await = Arc::new(stages);
    }

    /// Apply category `changes` to one stage for the batches that follow.
    pub async fn update_stage(
        &self,
        name: &str,
        changes: &BTreeMap<String, String>,
    ) -> ManagementResult<BTreeMap<String, ConfigItem>> {
        let mut guard = self.stages.write().await;
        let index = guard
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| self.missing(name))?;

        let (stage, applied) = guard[index].reconfigured(changes)?;
        let mut next = (**guard).clone();
        next[index] = Arc::new(stage);
        *guard = Arc::new(next);
        Ok(applied)
    }

    pub async fn set_parameter(&self, name: &str, key: &str, value: &str) -> ManagementResult<ConfigItem> {
        let changes = BTreeMap::from([(key.to_string(), value.to_string())]);
        let mut applied = self.update_stage(name, &changes).await?;
        applied
            .remove(key)
            .ok_or_else(|| ManagementError::Validation(format!("item '{}' was not applied", key)))
    }

    pub async fn set_enabled(&self, name: &str, enabled: bool) -> ManagementResult<()> {
        self.set_parameter(name, ENABLE_ITEM, if enabled { "true" } else { "false" })
            .await
            .map(|_| ())
    }

    fn missing(&self, name: &str) -> ManagementError {
        ManagementError::not_found("stage", stage_category_name(&self.service, name))
    }
}
