// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The platform: service registry, management surface and lifecycle.
//!
//! A [`Platform`] owns every south and north service, the filter definitions
//! pipelines refer to, the shared statistics and the asset tracker. All
//! structural changes go through one registry lock, so management calls are
//! serialized against each other while the scheduled tasks keep running.
//!
//! State is written to the configured [`StateStore`] periodically and on
//! shutdown. On start a stored state takes precedence over the YAML seed.
//!
//! # Example
//! ```rust,no_run
//! use the_northbound::config::PlatformConfig;
//! use the_northbound::engine::{Platform, ServiceSpec};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = Platform::builder(PlatformConfig::default()).build();
//! platform.start().await?;
//! platform.add_south_service(ServiceSpec::new("Counter #1", "counter")).await?;
//! platform.add_north_service(ServiceSpec::new("Archive", "capture")).await?;
//! platform.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backends::{ConnectorFactory, FilterFactory, SourceFactory};
use crate::config::consts::{STAT_DISCARDED, STAT_READINGS, STAT_READINGS_SENT};
use crate::config::{option_strings, ConfigCategory, ConfigItem, PlatformConfig};
use crate::engine::buffer::{OverflowPolicy, ReadingBuffer};
use crate::engine::ingest::IngestHub;
use crate::engine::north::NorthService;
use crate::engine::pipeline::{FilterStage, StageInfo};
use crate::engine::retry::RetryPolicy;
use crate::engine::scheduler::{ScheduleInfo, ScheduledTask};
use crate::engine::service::{
    AssetSummary, FilterInfo, NorthServiceInfo, PingInfo, PipelineUpdate, ServiceInfo,
    ServiceKind, ServiceSpec, SouthServiceInfo,
};
use crate::engine::south::SouthService;
use crate::errors::{ManagementError, ManagementResult};
use crate::model::Reading;
use crate::observability::messages::engine::{
    PlatformStarted, PlatformStopped, ScheduleToggled, ServiceAdded, ServiceRemoved,
    StatePersistFailed,
};
use crate::observability::messages::pipeline::{
    CategoryUpdateRejected, CategoryUpdated, PipelineUpdated,
};
use crate::observability::messages::StructuredLog;
use crate::stats::{
    asset_counter, service_sent_counter, AssetTracker, AssetTrackingRecord, EventKind,
    StatisticsRegistry,
};
use crate::storage::{
    JsonFileStore, MemoryStore, PersistedFilter, PersistedNorth, PersistedSouth, PersistedStage,
    PersistedState, StateStore,
};

/// Handle to a running platform. Clones share the same services.
#[derive(Clone)]
pub struct Platform {
    inner: Arc<Inner>,
}

pub struct PlatformBuilder {
    config: PlatformConfig,
    store: Option<Arc<dyn StateStore>>,
    connectors: ConnectorFactory,
}

struct Inner {
    seed: PlatformConfig,
    settings: Settings,
    store: Arc<dyn StateStore>,
    connectors: ConnectorFactory,
    stats: Arc<StatisticsRegistry>,
    tracker: Arc<AssetTracker>,
    hub: Arc<IngestHub>,
    registry: Mutex<Registry>,
    /// Held from state capture until the save completes, so snapshots reach
    /// the store one at a time and in capture order. Taken before `registry`.
    saving: Mutex<()>,
    persister: StdMutex<Option<Persister>>,
}

struct Settings {
    buffer_capacity: usize,
    overflow: OverflowPolicy,
    retry: RetryPolicy,
    drain_wait: Duration,
    persist_interval: Duration,
}

#[derive(Default)]
struct Registry {
    started_at: Option<Instant>,
    south: BTreeMap<String, SouthEntry>,
    north: BTreeMap<String, NorthEntry>,
    filters: BTreeMap<String, FilterDefinition>,
}

struct SouthEntry {
    service: Arc<SouthService>,
    task: Arc<ScheduledTask>,
}

struct NorthEntry {
    service: Arc<NorthService>,
    task: Arc<ScheduledTask>,
}

struct FilterDefinition {
    plugin: String,
    category: ConfigCategory,
}

struct Persister {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// State a north service is created with.
#[derive(Default)]
struct NorthSeed {
    values: Option<BTreeMap<String, String>>,
    stages: Vec<Arc<FilterStage>>,
    pending: Vec<Reading>,
}

/// What a category name resolves to.
enum CategoryTarget {
    North(Arc<NorthService>),
    Filter(String),
    Stage(Arc<NorthService>, String),
}

impl PlatformBuilder {
    /// Persist state through `store` instead of the one `storage` configures.
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Create north connectors through `connectors`.
    pub fn connectors(mut self, connectors: ConnectorFactory) -> Self {
        self.connectors = connectors;
        self
    }

    pub fn build(self) -> Platform {
        let config = self.config;
        let store = self.store.unwrap_or_else(|| match &config.storage.path {
            Some(path) => Arc::new(JsonFileStore::new(path.clone())) as Arc<dyn StateStore>,
            None => Arc::new(MemoryStore::new()),
        });
        let settings = Settings {
            buffer_capacity: config.buffer.get_capacity(),
            overflow: config.buffer.overflow,
            retry: RetryPolicy::from_config(&config.delivery),
            drain_wait: config.delivery.get_drain_wait(),
            persist_interval: config.storage.persist_interval(),
        };
        let stats = Arc::new(StatisticsRegistry::new());
        let tracker = Arc::new(AssetTracker::new());
        let hub = Arc::new(IngestHub::new(Arc::clone(&stats), Arc::clone(&tracker)));

        Platform {
            inner: Arc::new(Inner {
                seed: config,
                settings,
                store,
                connectors: self.connectors,
                stats,
                tracker,
                hub,
                registry: Mutex::new(Registry::default()),
                saving: Mutex::new(()),
                persister: StdMutex::new(None),
            }),
        }
    }
}

impl Platform {
    pub fn builder(config: PlatformConfig) -> PlatformBuilder {
        PlatformBuilder {
            config,
            store: None,
            connectors: ConnectorFactory::new(),
        }
    }

    /// The factory north connectors are created through.
    pub fn connectors(&self) -> &ConnectorFactory {
        &self.inner.connectors
    }

    pub async fn is_running(&self) -> bool {
        self.inner.registry.lock().await.started_at.is_some()
    }

    // ---- Lifecycle ----

    /// Bring up every service from the stored state, or from the config
    /// when nothing was stored yet.
    pub async fn start(&self) -> ManagementResult<()> {
        let mut registry = self.inner.registry.lock().await;
        if registry.started_at.is_some() {
            return Err(ManagementError::Conflict("platform is already running".to_string()));
        }

        let (result, restored) = match self.inner.store.load().await? {
            Some(state) => (self.restore(&mut registry, state).await, true),
            None => (self.seed(&mut registry).await, false),
        };
        if let Err(e) = result {
            self.teardown(&mut registry).await;
            return Err(e);
        }

        registry.started_at = Some(Instant::now());
        PlatformStarted {
            south_services: registry.south.len(),
            north_services: registry.north.len(),
            restored,
        }
        .log();
        drop(registry);

        self.start_persister();
        Ok(())
    }

    /// Stop every task after its running cycle and persist the full state,
    /// undelivered readings included.
    pub async fn shutdown(&self) -> ManagementResult<()> {
        self.stop_persister().await;

        let _saving = self.inner.saving.lock().await;
        let mut registry = self.inner.registry.lock().await;
        if registry.started_at.is_none() {
            return Ok(());
        }

        // South first so nothing lands in a buffer after its snapshot.
        for entry in registry.south.values() {
            entry.task.stop().await;
        }
        for entry in registry.north.values() {
            entry.task.stop().await;
        }

        let state = self.capture_state(&registry).await;
        let saved = self.inner.store.save(&state).await;
        if let Err(e) = &saved {
            StatePersistFailed { error: e }.log();
        }

        self.teardown(&mut registry).await;
        PlatformStopped {
            pending_readings: state.pending_readings(),
        }
        .log();

        saved.map_err(ManagementError::from)
    }

    /// Shut down and start again from the stored state.
    pub async fn restart(&self) -> ManagementResult<()> {
        self.shutdown().await?;
        self.start().await
    }

    /// Write the current state to the store now.
    pub async fn persist(&self) -> ManagementResult<()> {
        let _saving = self.inner.saving.lock().await;
        let registry = self.inner.registry.lock().await;
        if registry.started_at.is_none() {
            return Ok(());
        }
        let state = self.capture_state(&registry).await;
        drop(registry);
        self.inner.store.save(&state).await?;
        Ok(())
    }

    // ---- Services ----

    pub async fn add_south_service(&self, spec: ServiceSpec) -> ManagementResult<ScheduleInfo> {
        let mut registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        self.spawn_south(&mut registry, spec, Uuid::new_v4())
    }

    /// Create a north service with an empty pipeline. Returns its schedule.
    pub async fn add_north_service(&self, spec: ServiceSpec) -> ManagementResult<ScheduleInfo> {
        let mut registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        self.spawn_north(&mut registry, spec, Uuid::new_v4(), NorthSeed::default())
            .await
    }

    /// Remove a service and its schedule.
    ///
    /// A north service's pipeline and stage categories go with it, and the
    /// readings still in its buffer are dropped and counted as discarded.
    pub async fn delete_service(&self, name: &str) -> ManagementResult<()> {
        let mut registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;

        if let Some(entry) = registry.north.remove(name) {
            entry.task.remove().await;
            self.inner.hub.detach(name).await;
            let lost = entry.service.buffer().clear().await;
            self.inner.stats.increment(STAT_DISCARDED, lost as u64);
            ServiceRemoved {
                service: name,
                discarded_readings: lost,
            }
            .log();
            return Ok(());
        }

        if let Some(entry) = registry.south.remove(name) {
            entry.task.remove().await;
            ServiceRemoved {
                service: name,
                discarded_readings: 0,
            }
            .log();
            return Ok(());
        }

        Err(ManagementError::not_found("service", name))
    }

    pub async fn services(&self) -> Vec<ServiceInfo> {
        let registry = self.inner.registry.lock().await;
        let south = registry.south.values().map(|e| ServiceInfo {
            name: e.service.name().to_string(),
            kind: ServiceKind::South,
            plugin: e.service.plugin().to_string(),
            enabled: e.task.is_enabled(),
            schedule_id: e.task.id(),
        });
        let north = registry.north.values().map(|e| ServiceInfo {
            name: e.service.name().to_string(),
            kind: ServiceKind::North,
            plugin: e.service.plugin().to_string(),
            enabled: e.task.is_enabled(),
            schedule_id: e.task.id(),
        });
        let mut services: Vec<ServiceInfo> = south.chain(north).collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    pub async fn south_services(&self) -> Vec<SouthServiceInfo> {
        let registry = self.inner.registry.lock().await;
        registry
            .south
            .values()
            .map(|entry| {
                let name = entry.service.name();
                let assets = self
                    .inner
                    .tracker
                    .query(Some(EventKind::Ingest), Some(name), None)
                    .into_iter()
                    .map(|record| {
                        let count = self.inner.stats.get(&asset_counter(&record.asset));
                        (record.asset, count)
                    })
                    .collect();
                SouthServiceInfo {
                    name: name.to_string(),
                    plugin: entry.service.plugin().to_string(),
                    enabled: entry.task.is_enabled(),
                    assets,
                }
            })
            .collect()
    }

    pub async fn north_services(&self) -> Vec<NorthServiceInfo> {
        let registry = self.inner.registry.lock().await;
        let mut services = Vec::with_capacity(registry.north.len());
        for entry in registry.north.values() {
            let name = entry.service.name();
            services.push(NorthServiceInfo {
                name: name.to_string(),
                plugin: entry.service.plugin().to_string(),
                schedule_id: entry.task.id(),
                enabled: entry.task.is_enabled(),
                state: entry.task.state(),
                sent: self.inner.stats.get(&service_sent_counter(name)),
                pending: entry.service.buffer().len().await,
                pipeline: entry.service.pipeline().names().await,
            });
        }
        services
    }

    // ---- Schedules ----

    pub async fn schedules(&self) -> Vec<ScheduleInfo> {
        let registry = self.inner.registry.lock().await;
        registry.tasks().map(|task| task.info()).collect()
    }

    pub async fn schedule(&self, id: Uuid) -> ManagementResult<ScheduleInfo> {
        let registry = self.inner.registry.lock().await;
        registry
            .task_by_id(id)
            .map(|task| task.info())
            .ok_or_else(|| ManagementError::not_found("schedule", id.to_string()))
    }

    /// Enable or disable a schedule. Disabling returns once the running
    /// cycle, if any, has finished.
    pub async fn set_schedule_enabled(&self, id: Uuid, enabled: bool) -> ManagementResult<ScheduleInfo> {
        let registry = self.inner.registry.lock().await;
        let task = registry
            .task_by_id(id)
            .ok_or_else(|| ManagementError::not_found("schedule", id.to_string()))?;
        Self::toggle(task, enabled).await;
        Ok(task.info())
    }

    pub async fn enable_service(&self, name: &str) -> ManagementResult<ScheduleInfo> {
        self.set_service_enabled(name, true).await
    }

    pub async fn disable_service(&self, name: &str) -> ManagementResult<ScheduleInfo> {
        self.set_service_enabled(name, false).await
    }

    async fn set_service_enabled(&self, name: &str, enabled: bool) -> ManagementResult<ScheduleInfo> {
        let registry = self.inner.registry.lock().await;
        let task = registry
            .task_by_service(name)
            .ok_or_else(|| ManagementError::not_found("service", name))?;
        Self::toggle(task, enabled).await;
        Ok(task.info())
    }

    async fn toggle(task: &ScheduledTask, enabled: bool) {
        task.set_enabled(enabled).await;
        ScheduleToggled {
            service: task.service(),
            schedule_id: &task.id().to_string(),
            enabled,
        }
        .log();
    }

    // ---- Filters ----

    /// Define filter `name` using `plugin`, with `config` overriding the
    /// plugin defaults. Returns the new filter category.
    pub async fn create_filter(
        &self,
        name: &str,
        plugin: &str,
        config: &BTreeMap<String, String>,
    ) -> ManagementResult<ConfigCategory> {
        let mut registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        Self::check_name_free(&registry, name)?;

        let (category, _) = FilterFactory::category(plugin)?.renamed(name).apply(config)?;
        FilterFactory::create(plugin, &category)?;

        registry.filters.insert(
            name.to_string(),
            FilterDefinition {
                plugin: plugin.to_string(),
                category: category.clone(),
            },
        );
        tracing::info!(filter = %name, plugin = %plugin, "Filter created");
        Ok(category)
    }

    pub async fn delete_filter(&self, name: &str) -> ManagementResult<()> {
        let mut registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        if !registry.filters.contains_key(name) {
            return Err(ManagementError::not_found("filter", name));
        }

        let used_by = registry.users_of(name).await;
        if !used_by.is_empty() {
            return Err(ManagementError::Conflict(format!(
                "filter '{}' is used by [{}]",
                name,
                used_by.join(", ")
            )));
        }

        registry.filters.remove(name);
        tracing::info!(filter = %name, "Filter deleted");
        Ok(())
    }

    pub async fn filters(&self) -> Vec<FilterInfo> {
        let registry = self.inner.registry.lock().await;
        let mut filters = Vec::with_capacity(registry.filters.len());
        for (name, definition) in &registry.filters {
            filters.push(FilterInfo {
                name: name.clone(),
                plugin: definition.plugin.clone(),
                used_by: registry.users_of(name).await,
            });
        }
        filters
    }

    // ---- Pipelines ----

    /// Stage names of a north service, in order.
    pub async fn pipeline(&self, service: &str) -> ManagementResult<Vec<String>> {
        let registry = self.inner.registry.lock().await;
        Ok(registry.north_service(service)?.pipeline().names().await)
    }

    pub async fn pipeline_stages(&self, service: &str) -> ManagementResult<Vec<StageInfo>> {
        let registry = self.inner.registry.lock().await;
        Ok(registry.north_service(service)?.pipeline().stages().await)
    }

    /// Replace the pipeline of `service` with `names`, or append them.
    ///
    /// Stages already in the pipeline keep their per-service category. The
    /// new list is built in full and swapped in at once.
    pub async fn update_pipeline(
        &self,
        service: &str,
        names: &[String],
        update: PipelineUpdate,
    ) -> ManagementResult<Vec<String>> {
        let registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        let north = registry.north_service(service)?;
        let current = north.pipeline().snapshot().await;

        let mut next: Vec<Arc<FilterStage>> = if update.append {
            current.to_vec()
        } else {
            Vec::new()
        };
        for name in names {
            if next.iter().any(|stage| stage.name() == name) {
                if update.allow_duplicates {
                    continue;
                }
                return Err(ManagementError::Conflict(format!(
                    "filter '{}' is already in the pipeline of '{}'",
                    name, service
                )));
            }
            let stage = match current.iter().find(|stage| stage.name() == name) {
                Some(existing) => Arc::clone(existing),
                None => Arc::new(registry.build_stage(service, name)?),
            };
            next.push(stage);
        }

        north.pipeline().replace(next).await;
        let stages = north.pipeline().names().await;
        PipelineUpdated {
            service,
            stages: &stages,
        }
        .log();
        Ok(stages)
    }

    /// Insert filter `filter` at `position` (`None` appends) and return its
    /// ordinal.
    pub async fn insert_filter(
        &self,
        service: &str,
        filter: &str,
        position: Option<usize>,
        allow_duplicates: bool,
    ) -> ManagementResult<usize> {
        let registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        let north = registry.north_service(service)?;
        let stage = registry.build_stage(service, filter)?;

        let ordinal = north.pipeline().insert(stage, position, allow_duplicates).await?;
        self.log_pipeline(&north).await;
        Ok(ordinal)
    }

    pub async fn remove_filter(&self, service: &str, filter: &str) -> ManagementResult<()> {
        let registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        let north = registry.north_service(service)?;

        north.pipeline().remove(filter).await?;
        self.log_pipeline(&north).await;
        Ok(())
    }

    /// Reorder the pipeline of `service`. Batches see either the old or the
    /// new order, never a mix.
    pub async fn reorder_pipeline(&self, service: &str, names: &[String]) -> ManagementResult<()> {
        let registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;
        let north = registry.north_service(service)?;

        north.pipeline().reorder(names).await?;
        self.log_pipeline(&north).await;
        Ok(())
    }

    async fn log_pipeline(&self, north: &NorthService) {
        let stages = north.pipeline().names().await;
        PipelineUpdated {
            service: north.name(),
            stages: &stages,
        }
        .log();
    }

    // ---- Categories ----

    /// Look up a category: a north service, a filter definition or a stage
    /// `<service>_<stage>`, in that order.
    pub async fn category(&self, name: &str) -> ManagementResult<ConfigCategory> {
        let registry = self.inner.registry.lock().await;
        match registry.resolve(name).await? {
            CategoryTarget::North(north) => Ok(north.category().await),
            CategoryTarget::Filter(filter) => registry
                .filters
                .get(&filter)
                .map(|definition| definition.category.clone())
                .ok_or_else(|| ManagementError::not_found("category", name)),
            CategoryTarget::Stage(north, stage) => north
                .pipeline()
                .stage(&stage)
                .await
                .map(|stage| stage.category().clone())
                .ok_or_else(|| ManagementError::not_found("category", name)),
        }
    }

    /// Validate and apply `changes` to category `name` as a whole.
    ///
    /// Returns the items that were set. Any invalid key or value rejects the
    /// request and leaves every value as it was.
    pub async fn update_category(
        &self,
        name: &str,
        changes: &BTreeMap<String, String>,
    ) -> ManagementResult<BTreeMap<String, ConfigItem>> {
        let mut registry = self.inner.registry.lock().await;
        Self::require_running(&registry)?;

        let target = registry.resolve(name).await;
        let result = match target {
            Ok(CategoryTarget::North(north)) => north.update_category(changes).await,
            Ok(CategoryTarget::Filter(filter)) => registry.update_filter(&filter, changes),
            Ok(CategoryTarget::Stage(north, stage)) => {
                north.pipeline().update_stage(&stage, changes).await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(applied) => {
                let keys: Vec<&str> = applied.keys().map(String::as_str).collect();
                CategoryUpdated {
                    category: name,
                    keys: &keys,
                }
                .log();
            }
            Err(e) => CategoryUpdateRejected {
                category: name,
                error: e,
            }
            .log(),
        }
        result
    }

    // ---- Observability ----

    pub async fn ping(&self) -> PingInfo {
        let uptime = self
            .inner
            .registry
            .lock()
            .await
            .started_at
            .map_or(Duration::ZERO, |started| started.elapsed());
        PingInfo {
            uptime,
            data_read: self.inner.stats.get(STAT_READINGS),
            data_sent: self.inner.stats.get(STAT_READINGS_SENT),
        }
    }

    pub fn statistics(&self) -> BTreeMap<String, u64> {
        self.inner.stats.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.inner.stats.reset();
        tracing::info!("Statistics reset");
    }

    pub fn asset_tracking(
        &self,
        event: Option<EventKind>,
        service: Option<&str>,
        asset: Option<&str>,
    ) -> Vec<AssetTrackingRecord> {
        self.inner.tracker.query(event, service, asset)
    }

    /// Every ingested asset with its reading count.
    pub fn assets(&self) -> Vec<AssetSummary> {
        let mut assets: Vec<String> = self
            .inner
            .tracker
            .query(Some(EventKind::Ingest), None, None)
            .into_iter()
            .map(|record| record.asset)
            .collect();
        assets.sort();
        assets.dedup();
        assets
            .into_iter()
            .map(|asset| AssetSummary {
                count: self.inner.stats.get(&asset_counter(&asset)),
                asset,
            })
            .collect()
    }

    // ---- Internals ----

    fn require_running(registry: &Registry) -> ManagementResult<()> {
        if registry.started_at.is_none() {
            return Err(ManagementError::Conflict("platform is not running".to_string()));
        }
        Ok(())
    }

    fn check_name_free(registry: &Registry, name: &str) -> ManagementResult<()> {
        if name.trim().is_empty() {
            return Err(ManagementError::Validation("name must not be empty".to_string()));
        }
        if registry.south.contains_key(name) || registry.north.contains_key(name) {
            return Err(ManagementError::Conflict(format!("service '{}' already exists", name)));
        }
        if registry.filters.contains_key(name) {
            return Err(ManagementError::Conflict(format!("filter '{}' already exists", name)));
        }
        Ok(())
    }

    fn check_interval(spec: &ServiceSpec) -> ManagementResult<()> {
        if spec.interval.is_zero() {
            return Err(ManagementError::Validation(format!(
                "service '{}': interval must be greater than zero",
                spec.name
            )));
        }
        Ok(())
    }

    fn spawn_south(
        &self,
        registry: &mut Registry,
        spec: ServiceSpec,
        schedule_id: Uuid,
    ) -> ManagementResult<ScheduleInfo> {
        Self::check_name_free(registry, &spec.name)?;
        Self::check_interval(&spec)?;

        let source = SourceFactory::create(&spec.plugin, &spec.name, &spec.options)?;
        let service = Arc::new(SouthService::new(
            spec.name.clone(),
            spec.plugin.clone(),
            spec.options,
            source,
            Arc::clone(&self.inner.hub),
        ));
        let task = ScheduledTask::spawn(
            schedule_id,
            spec.name.clone(),
            spec.interval,
            spec.enabled,
            service.clone(),
        );

        ServiceAdded {
            service: &spec.name,
            kind: "south",
            plugin: &spec.plugin,
        }
        .log();
        let info = task.info();
        registry.south.insert(spec.name, SouthEntry { service, task });
        Ok(info)
    }

    async fn spawn_north(
        &self,
        registry: &mut Registry,
        spec: ServiceSpec,
        schedule_id: Uuid,
        seed: NorthSeed,
    ) -> ManagementResult<ScheduleInfo> {
        Self::check_name_free(registry, &spec.name)?;
        Self::check_interval(&spec)?;

        let defaults = ConnectorFactory::category(&spec.plugin)?.renamed(spec.name.clone());
        let category = match &seed.values {
            Some(values) => {
                let mut category = defaults;
                category.restore_values(values);
                category
            }
            None => defaults.apply(&spec.options)?.0,
        };
        let connector = self.inner.connectors.create(&spec.plugin)?;

        let settings = &self.inner.settings;
        let buffer = Arc::new(ReadingBuffer::new(settings.buffer_capacity, settings.overflow));
        for reading in seed.pending {
            buffer.push(reading).await;
        }

        let service = Arc::new(NorthService::new(
            spec.name.clone(),
            spec.plugin.clone(),
            connector,
            category,
            Arc::clone(&buffer),
            Arc::clone(&self.inner.stats),
            Arc::clone(&self.inner.tracker),
            settings.retry.clone(),
            settings.drain_wait,
        ));
        service.pipeline().replace(seed.stages).await;

        self.inner.hub.attach(&spec.name, buffer).await;
        let task = ScheduledTask::spawn(
            schedule_id,
            spec.name.clone(),
            spec.interval,
            spec.enabled,
            service.clone(),
        );

        ServiceAdded {
            service: &spec.name,
            kind: "north",
            plugin: &spec.plugin,
        }
        .log();
        let info = task.info();
        registry.north.insert(spec.name, NorthEntry { service, task });
        Ok(info)
    }

    /// Populate an empty registry from the YAML config.
    async fn seed(&self, registry: &mut Registry) -> ManagementResult<()> {
        let config = &self.inner.seed;

        for filter in &config.filters {
            Self::check_name_free(registry, &filter.name)?;
            let (category, _) = FilterFactory::category(&filter.plugin)?
                .renamed(filter.name.clone())
                .apply(&option_strings(&filter.options))?;
            FilterFactory::create(&filter.plugin, &category)?;
            registry.filters.insert(
                filter.name.clone(),
                FilterDefinition {
                    plugin: filter.plugin.clone(),
                    category,
                },
            );
        }

        // North before south so the first readings already find their buffers.
        for north in &config.north {
            let mut stages = Vec::with_capacity(north.pipeline.len());
            for stage in &north.pipeline {
                stages.push(Arc::new(registry.build_stage(&north.name, stage)?));
            }
            let seed = NorthSeed {
                stages,
                ..NorthSeed::default()
            };
            self.spawn_north(registry, ServiceSpec::from(north), Uuid::new_v4(), seed)
                .await?;
        }

        for south in &config.south {
            self.spawn_south(registry, ServiceSpec::from(south), Uuid::new_v4())?;
        }
        Ok(())
    }

    /// Populate an empty registry from a stored state.
    ///
    /// Entries whose plugin is no longer available are skipped with a
    /// warning rather than failing the start.
    async fn restore(&self, registry: &mut Registry, state: PersistedState) -> ManagementResult<()> {
        self.inner.stats.restore(&state.statistics);
        self.inner.tracker.restore(state.asset_tracking);

        for filter in state.filters {
            let mut category = match FilterFactory::category(&filter.plugin) {
                Ok(category) => category.renamed(filter.name.clone()),
                Err(e) => {
                    tracing::warn!(filter = %filter.name, error = %e, "Skipping stored filter");
                    continue;
                }
            };
            category.restore_values(&filter.values);
            registry.filters.insert(
                filter.name,
                FilterDefinition {
                    plugin: filter.plugin,
                    category,
                },
            );
        }

        for north in state.north {
            let mut stages = Vec::with_capacity(north.pipeline.len());
            for stored in &north.pipeline {
                match registry.restore_stage(&north.name, stored) {
                    Ok(stage) => stages.push(Arc::new(stage)),
                    Err(e) => {
                        tracing::warn!(service = %north.name, stage = %stored.name, error = %e, "Skipping stored stage")
                    }
                }
            }
            let spec = ServiceSpec::new(north.name.clone(), north.plugin)
                .interval(Duration::from_millis(north.interval_ms))
                .enabled(north.enabled);
            let seed = NorthSeed {
                values: Some(north.values),
                stages,
                pending: north.pending,
            };
            if let Err(e) = self.spawn_north(registry, spec, north.schedule_id, seed).await {
                tracing::warn!(service = %north.name, error = %e, "Skipping stored north service");
            }
        }

        for south in state.south {
            let mut spec = ServiceSpec::new(south.name.clone(), south.plugin)
                .interval(Duration::from_millis(south.interval_ms))
                .enabled(south.enabled);
            spec.options = south.options;
            if let Err(e) = self.spawn_south(registry, spec, south.schedule_id) {
                tracing::warn!(service = %south.name, error = %e, "Skipping stored south service");
            }
        }
        Ok(())
    }

    async fn capture_state(&self, registry: &Registry) -> PersistedState {
        let mut state = PersistedState::new();
        state.statistics = self.inner.stats.snapshot();
        state.asset_tracking = self.inner.tracker.records();

        state.filters = registry
            .filters
            .iter()
            .map(|(name, definition)| PersistedFilter {
                name: name.clone(),
                plugin: definition.plugin.clone(),
                values: definition.category.values(),
            })
            .collect();

        state.south = registry
            .south
            .values()
            .map(|entry| PersistedSouth {
                name: entry.service.name().to_string(),
                plugin: entry.service.plugin().to_string(),
                schedule_id: entry.task.id(),
                enabled: entry.task.is_enabled(),
                interval_ms: entry.task.interval().as_millis() as u64,
                options: entry.service.options().clone(),
            })
            .collect();

        for entry in registry.north.values() {
            let service = &entry.service;
            let pipeline = service
                .pipeline()
                .snapshot()
                .await
                .iter()
                .map(|stage| PersistedStage {
                    name: stage.name().to_string(),
                    values: stage.category().values(),
                })
                .collect();
            state.north.push(PersistedNorth {
                name: service.name().to_string(),
                plugin: service.plugin().to_string(),
                schedule_id: entry.task.id(),
                enabled: entry.task.is_enabled(),
                interval_ms: entry.task.interval().as_millis() as u64,
                values: service.category().await.values(),
                pipeline,
                pending: service.buffer().snapshot().await,
            });
        }

        state
    }

    /// Stop and forget every service and definition.
    async fn teardown(&self, registry: &mut Registry) {
        for entry in registry.south.values() {
            entry.task.stop().await;
        }
        for (name, entry) in &registry.north {
            entry.task.stop().await;
            self.inner.hub.detach(name).await;
        }
        *registry = Registry::default();
    }

    fn start_persister(&self) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.settings.persist_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(inner) = weak.upgrade() else { break };
                let platform = Platform { inner };
                if let Err(e) = platform.persist().await {
                    StatePersistFailed { error: &e }.log();
                }
            }
        });

        let previous = self
            .inner
            .persister
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(Persister { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    async fn stop_persister(&self) {
        let persister = self
            .inner
            .persister
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(persister) = persister {
            persister.cancel.cancel();
            if let Err(e) = persister.handle.await {
                tracing::error!(error = %e, "Persist task ended abnormally");
            }
        }
    }
}

impl Registry {
    fn tasks(&self) -> impl Iterator<Item = &Arc<ScheduledTask>> {
        self.south
            .values()
            .map(|e| &e.task)
            .chain(self.north.values().map(|e| &e.task))
    }

    fn task_by_id(&self, id: Uuid) -> Option<&Arc<ScheduledTask>> {
        self.tasks().find(|task| task.id() == id)
    }

    fn task_by_service(&self, name: &str) -> Option<&Arc<ScheduledTask>> {
        self.south
            .get(name)
            .map(|e| &e.task)
            .or_else(|| self.north.get(name).map(|e| &e.task))
    }

    fn north_service(&self, name: &str) -> ManagementResult<Arc<NorthService>> {
        self.north
            .get(name)
            .map(|e| Arc::clone(&e.service))
            .ok_or_else(|| ManagementError::not_found("north service", name))
    }

    fn definition(&self, filter: &str) -> ManagementResult<&FilterDefinition> {
        self.filters
            .get(filter)
            .ok_or_else(|| ManagementError::not_found("filter", filter))
    }

    /// A fresh stage of `service` from the current definition of `filter`.
    fn build_stage(&self, service: &str, filter: &str) -> ManagementResult<FilterStage> {
        let definition = self.definition(filter)?;
        Ok(FilterStage::build(
            service,
            filter,
            &definition.plugin,
            &definition.category,
        )?)
    }

    fn restore_stage(&self, service: &str, stored: &PersistedStage) -> ManagementResult<FilterStage> {
        let definition = self.definition(&stored.name)?;
        let mut category = definition.category.clone();
        category.restore_values(&stored.values);
        Ok(FilterStage::build(service, &stored.name, &definition.plugin, &category)?)
    }

    /// North services whose pipeline contains `filter`.
    async fn users_of(&self, filter: &str) -> Vec<String> {
        let mut users = Vec::new();
        for (name, entry) in &self.north {
            if entry.service.pipeline().contains(filter).await {
                users.push(name.clone());
            }
        }
        users
    }

    async fn resolve(&self, name: &str) -> ManagementResult<CategoryTarget> {
        if let Some(entry) = self.north.get(name) {
            return Ok(CategoryTarget::North(Arc::clone(&entry.service)));
        }
        if self.filters.contains_key(name) {
            return Ok(CategoryTarget::Filter(name.to_string()));
        }
        for (service, entry) in &self.north {
            let Some(stage) = name
                .strip_prefix(service.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
            else {
                continue;
            };
            if entry.service.pipeline().contains(stage).await {
                return Ok(CategoryTarget::Stage(Arc::clone(&entry.service), stage.to_string()));
            }
        }
        Err(ManagementError::not_found("category", name))
    }

    /// Apply `changes` to a filter definition. Stages already built from it
    /// keep their own category.
    fn update_filter(
        &mut self,
        filter: &str,
        changes: &BTreeMap<String, String>,
    ) -> ManagementResult<BTreeMap<String, ConfigItem>> {
        let definition = self
            .filters
            .get_mut(filter)
            .ok_or_else(|| ManagementError::not_found("filter", filter))?;
        let (category, applied) = definition.category.apply(changes)?;
        FilterFactory::create(&definition.plugin, &category)?;
        definition.category = category;
        Ok(applied)
    }
}
