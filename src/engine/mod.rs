// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime engine: buffers, pipelines, scheduled services and the platform
//! that ties them together.

pub mod buffer;
pub mod ingest;
pub mod north;
pub mod pipeline;
pub mod platform;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod south;

pub use buffer::{OverflowPolicy, PushOutcome, ReadingBuffer};
pub use north::{CycleOutcome, NorthService};
pub use pipeline::{FilterPipeline, FilterStage, StageInfo};
pub use platform::{Platform, PlatformBuilder};
pub use retry::RetryPolicy;
pub use scheduler::{ScheduleInfo, ScheduledTask, TaskState};
pub use service::{
    AssetSummary, FilterInfo, NorthServiceInfo, PingInfo, PipelineUpdate, ServiceInfo,
    ServiceKind, ServiceSpec, SouthServiceInfo,
};
pub use south::SouthService;
