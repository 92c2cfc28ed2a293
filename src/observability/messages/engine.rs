// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for platform, service and schedule lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Platform started and its tasks are scheduled.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_northbound::observability::messages::engine::PlatformStarted;
///
/// let msg = PlatformStarted {
///     south_services: 1,
///     north_services: 2,
///     restored: true,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PlatformStarted {
    pub south_services: usize,
    pub north_services: usize,
    pub restored: bool,
}

impl Display for PlatformStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let origin = if self.restored { "persisted state" } else { "configuration" };
        write!(
            f,
            "Platform started from {}: {} south, {} north services",
            origin, self.south_services, self.north_services
        )
    }
}

impl StructuredLog for PlatformStarted {
    fn log(&self) {
        tracing::info!(
            south_services = self.south_services,
            north_services = self.north_services,
            restored = self.restored,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "platform",
            span_name = name,
            south_services = self.south_services,
            north_services = self.north_services,
        )
    }
}

/// Platform stopped and its state was saved.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PlatformStopped {
    pub pending_readings: usize,
}

impl Display for PlatformStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Platform stopped: {} undelivered readings persisted",
            self.pending_readings
        )
    }
}

impl StructuredLog for PlatformStopped {
    fn log(&self) {
        tracing::info!(pending_readings = self.pending_readings, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("platform_stopped", span_name = name, pending_readings = self.pending_readings)
    }
}

/// A south or north service was created.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ServiceAdded<'a> {
    pub service: &'a str,
    pub kind: &'a str,
    pub plugin: &'a str,
}

impl Display for ServiceAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Added {} service '{}' using plugin '{}'",
            self.kind, self.service, self.plugin
        )
    }
}

impl StructuredLog for ServiceAdded<'_> {
    fn log(&self) {
        tracing::info!(
            service = self.service,
            kind = self.kind,
            plugin = self.plugin,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "service",
            span_name = name,
            service = self.service,
            kind = self.kind,
            plugin = self.plugin,
        )
    }
}

/// A service was deleted.
///
/// # Log Level
/// `warn!` when buffered readings were discarded, `info!` otherwise
pub struct ServiceRemoved<'a> {
    pub service: &'a str,
    pub discarded_readings: usize,
}

impl Display for ServiceRemoved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Removed service '{}' ({} buffered readings discarded)",
            self.service, self.discarded_readings
        )
    }
}

impl StructuredLog for ServiceRemoved<'_> {
    fn log(&self) {
        if self.discarded_readings > 0 {
            tracing::warn!(
                service = self.service,
                discarded_readings = self.discarded_readings,
                "{}", self
            );
        } else {
            tracing::info!(service = self.service, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("service_removed", span_name = name, service = self.service)
    }
}

/// A schedule was enabled or disabled.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ScheduleToggled<'a> {
    pub service: &'a str,
    pub schedule_id: &'a str,
    pub enabled: bool,
}

impl Display for ScheduleToggled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let state = if self.enabled { "enabled" } else { "disabled" };
        write!(f, "Schedule {} for '{}' {}", self.schedule_id, self.service, state)
    }
}

impl StructuredLog for ScheduleToggled<'_> {
    fn log(&self) {
        tracing::info!(
            service = self.service,
            schedule_id = self.schedule_id,
            enabled = self.enabled,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "schedule",
            span_name = name,
            service = self.service,
            schedule_id = self.schedule_id,
        )
    }
}

/// Writing platform state to the store failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StatePersistFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for StatePersistFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to persist platform state: {}", self.error)
    }
}

impl StructuredLog for StatePersistFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("persist_failed", span_name = name, error = %self.error)
    }
}
