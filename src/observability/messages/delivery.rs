// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for north egress outcomes and buffer discards.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A batch was accepted by the sink.
///
/// # Log Level
/// `debug!` - Emitted every cycle
///
/// # Example
/// ```
/// use the_northbound::observability::messages::delivery::BatchDelivered;
/// use std::time::Duration;
///
/// let msg = BatchDelivered {
///     service: "Archive",
///     count: 12,
///     attempts: 1,
///     duration: Duration::from_millis(8),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct BatchDelivered<'a> {
    pub service: &'a str,
    pub count: usize,
    pub attempts: u32,
    pub duration: Duration,
}

impl Display for BatchDelivered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' delivered {} readings in {} attempt(s), duration={:?}",
            self.service, self.count, self.attempts, self.duration
        )
    }
}

impl StructuredLog for BatchDelivered<'_> {
    fn log(&self) {
        tracing::debug!(
            service = self.service,
            count = self.count,
            attempts = self.attempts,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "delivery",
            span_name = name,
            service = self.service,
            count = self.count,
        )
    }
}

/// The sink refused a batch for good; its readings are lost.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BatchRejected<'a> {
    pub service: &'a str,
    pub count: usize,
    pub reason: &'a str,
}

impl Display for BatchRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' sink rejected a batch of {} readings, readings dropped: {}",
            self.service, self.count, self.reason
        )
    }
}

impl StructuredLog for BatchRejected<'_> {
    fn log(&self) {
        tracing::error!(
            service = self.service,
            count = self.count,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("batch_rejected", span_name = name, service = self.service)
    }
}

/// A transient failure will be retried after a backoff.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct DeliveryRetrying<'a> {
    pub service: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub reason: &'a str,
}

impl Display for DeliveryRetrying<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' send attempt {}/{} failed ({}), retrying in {:?}",
            self.service, self.attempt, self.max_attempts, self.reason, self.backoff
        )
    }
}

impl StructuredLog for DeliveryRetrying<'_> {
    fn log(&self) {
        tracing::warn!(
            service = self.service,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            backoff_ms = self.backoff.as_millis() as u64,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("delivery_retry", span_name = name, service = self.service, attempt = self.attempt)
    }
}

/// Every attempt this cycle failed; the batch goes back to the buffer.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DeliveryExhausted<'a> {
    pub service: &'a str,
    pub count: usize,
    pub attempts: u32,
    pub reason: &'a str,
}

impl Display for DeliveryExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' could not deliver {} readings after {} attempts ({}), requeued for the next cycle",
            self.service, self.count, self.attempts, self.reason
        )
    }
}

impl StructuredLog for DeliveryExhausted<'_> {
    fn log(&self) {
        tracing::error!(
            service = self.service,
            count = self.count,
            attempts = self.attempts,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("delivery_exhausted", span_name = name, service = self.service)
    }
}

/// Readings were dropped by a full buffer.
///
/// # Log Level
/// `warn!` - Data loss under the configured overflow policy
pub struct ReadingsDiscarded<'a> {
    pub service: &'a str,
    pub count: usize,
    pub policy: &'a str,
}

impl Display for ReadingsDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Buffer for '{}' is full, discarded {} readings ({})",
            self.service, self.count, self.policy
        )
    }
}

impl StructuredLog for ReadingsDiscarded<'_> {
    fn log(&self) {
        tracing::warn!(
            service = self.service,
            count = self.count,
            policy = self.policy,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("readings_discarded", span_name = name, service = self.service)
    }
}
