// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded FIFO buffer of readings waiting for a north service.
//!
//! Every north service owns one [`ReadingBuffer`]. South services push into it
//! through the ingest hub and the service's egress cycle drains it in batches.
//!
//! # Guarantees
//!
//! - **Ordering**: readings leave in the order they were pushed; a batch that
//!   could not be delivered is put back at the head with [`ReadingBuffer::requeue_front`]
//! - **Non-blocking push**: a full buffer never makes a producer wait; the
//!   configured [`OverflowPolicy`] decides which reading is lost
//! - **Single drain**: at most one `drain_batch` runs at a time, so two cycles
//!   can never split or reorder a batch between them
//! - **Bounded waits**: a drain on an empty buffer gives up after `max_wait`
//!
//! # Example
//! ```rust
//! use the_northbound::engine::buffer::{OverflowPolicy, PushOutcome, ReadingBuffer};
//! use the_northbound::model::Reading;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let buffer = ReadingBuffer::new(2, OverflowPolicy::DropOldest);
//! buffer.push(Reading::new("a", "south")).await;
//! buffer.push(Reading::new("b", "south")).await;
//!
//! // Full: the oldest reading makes room for the new one.
//! let outcome = buffer.push(Reading::new("c", "south")).await;
//! assert_eq!(outcome, PushOutcome::DisplacedOldest);
//!
//! let batch = buffer.drain_batch(10, Duration::from_millis(10)).await;
//! let assets: Vec<_> = batch.iter().map(|r| r.asset_code.as_str()).collect();
//! assert_eq!(assets, vec!["b", "c"]);
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::model::{Batch, Reading};

/// What a full buffer gives up to stay within capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest buffered reading to admit the new one.
    #[default]
    DropOldest,
    /// Keep the buffer as is and refuse the new reading.
    RejectNewest,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropOldest => write!(f, "drop_oldest"),
            OverflowPolicy::RejectNewest => write!(f, "reject_newest"),
        }
    }
}

/// Result of a single [`ReadingBuffer::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted,
    /// Accepted after evicting the oldest reading.
    DisplacedOldest,
    /// Refused because the buffer was full.
    RejectedNewest,
}

impl PushOutcome {
    /// Number of readings lost by this push.
    pub fn discarded(&self) -> usize {
        match self {
            PushOutcome::Accepted => 0,
            PushOutcome::DisplacedOldest | PushOutcome::RejectedNewest => 1,
        }
    }
}

pub struct ReadingBuffer {
    queue: Mutex<VecDeque<Reading>>,
    available: Notify,
    drain_lock: Mutex<()>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl ReadingBuffer {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            available: Notify::new(),
            drain_lock: Mutex::new(()),
            capacity,
            policy,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Append a reading at the tail.
    pub async fn push(&self, reading: Reading) -> PushOutcome {
        let outcome = {
            let mut queue = self.queue.lock().await;
            if queue.len() < self.capacity {
                queue.push_back(reading);
                PushOutcome::Accepted
            } else {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        queue.pop_front();
                        queue.push_back(reading);
                        PushOutcome::DisplacedOldest
                    }
                    OverflowPolicy::RejectNewest => PushOutcome::RejectedNewest,
                }
            }
        };

        if outcome != PushOutcome::RejectedNewest {
            self.available.notify_one();
        }
        outcome
    }

    /// Take up to `max_count` readings from the head.
    ///
    /// Waits at most `max_wait` for the first reading to arrive and returns an
    /// empty batch if none does.
    pub async fn drain_batch(&self, max_count: usize, max_wait: Duration) -> Batch {
        let _drain = self.drain_lock.lock().await;
        let deadline = Instant::now() + max_wait;

        loop {
            {
                let mut queue = self.queue.lock().await;
                if !queue.is_empty() {
                    let count = max_count.max(1).min(queue.len());
                    return queue.drain(..count).collect();
                }
            }

            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return Vec::new();
            }
        }
    }

    /// Put an undelivered batch back at the head, keeping its order.
    ///
    /// Readings that pushed in since the batch was drained may leave the
    /// buffer over capacity; the overflow policy then trims it and the number
    /// of readings lost is returned.
    pub async fn requeue_front(&self, batch: Batch) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let discarded = {
            let mut queue = self.queue.lock().await;
            for reading in batch.into_iter().rev() {
                queue.push_front(reading);
            }
            let excess = queue.len().saturating_sub(self.capacity);
            for _ in 0..excess {
                match self.policy {
                    OverflowPolicy::DropOldest => queue.pop_front(),
                    OverflowPolicy::RejectNewest => queue.pop_back(),
                };
            }
            excess
        };

        self.available.notify_one();
        discarded
    }

    /// Copy of the buffered readings, oldest first.
    pub async fn snapshot(&self) -> Vec<Reading> {
        self.queue.lock().await.iter().cloned().collect()
    }

    /// Remove every buffered reading and return how many there were.
    pub async fn clear(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let count = queue.len();
        queue.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DatapointValue;
    use std::sync::Arc;

    fn reading(n: i64) -> Reading {
        Reading::new("counter", "south").with_datapoint("value", DatapointValue::Integer(n))
    }

    fn values(batch: &[Reading]) -> Vec<i64> {
        batch
            .iter()
            .map(|r| match r.datapoint("value") {
                Some(DatapointValue::Integer(v)) => *v,
                other => panic!("unexpected datapoint {:?}", other),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_drain_preserves_fifo_order_across_batches() {
        let buffer = ReadingBuffer::new(100, OverflowPolicy::DropOldest);
        for n in 0..7 {
            assert_eq!(buffer.push(reading(n)).await, PushOutcome::Accepted);
        }

        let first = buffer.drain_batch(3, Duration::from_millis(10)).await;
        let second = buffer.drain_batch(3, Duration::from_millis(10)).await;
        let third = buffer.drain_batch(3, Duration::from_millis(10)).await;

        assert_eq!(values(&first), vec![0, 1, 2]);
        assert_eq!(values(&second), vec![3, 4, 5]);
        assert_eq!(values(&third), vec![6]);
        assert!(buffer.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_drain_returns_after_max_wait() {
        let buffer = ReadingBuffer::new(10, OverflowPolicy::DropOldest);
        let started = std::time::Instant::now();
        let batch = buffer.drain_batch(5, Duration::from_millis(30)).await;
        assert!(batch.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_drain_wakes_when_reading_arrives() {
        let buffer = Arc::new(ReadingBuffer::new(10, OverflowPolicy::DropOldest));
        let producer = Arc::clone(&buffer);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.push(reading(42)).await;
        });

        let batch = buffer.drain_batch(5, Duration::from_secs(5)).await;
        assert_eq!(values(&batch), vec![42]);
    }

    #[tokio::test]
    async fn test_reject_newest_keeps_existing_readings() {
        let buffer = ReadingBuffer::new(2, OverflowPolicy::RejectNewest);
        buffer.push(reading(1)).await;
        buffer.push(reading(2)).await;
        let outcome = buffer.push(reading(3)).await;

        assert_eq!(outcome, PushOutcome::RejectedNewest);
        assert_eq!(outcome.discarded(), 1);
        assert_eq!(values(&buffer.snapshot().await), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_requeue_front_restores_order() {
        let buffer = ReadingBuffer::new(10, OverflowPolicy::DropOldest);
        for n in 0..4 {
            buffer.push(reading(n)).await;
        }
        let batch = buffer.drain_batch(2, Duration::from_millis(10)).await;
        buffer.push(reading(4)).await;

        assert_eq!(buffer.requeue_front(batch).await, 0);
        assert_eq!(values(&buffer.snapshot().await), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_requeue_over_capacity_applies_policy() {
        let oldest = ReadingBuffer::new(3, OverflowPolicy::DropOldest);
        let newest = ReadingBuffer::new(3, OverflowPolicy::RejectNewest);
        for buffer in [&oldest, &newest] {
            for n in 0..3 {
                buffer.push(reading(n)).await;
            }
            let batch = buffer.drain_batch(2, Duration::from_millis(10)).await;
            buffer.push(reading(3)).await;
            buffer.push(reading(4)).await;
            assert_eq!(buffer.requeue_front(batch).await, 2);
        }

        assert_eq!(values(&oldest.snapshot().await), vec![2, 3, 4]);
        assert_eq!(values(&newest.snapshot().await), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_clear_reports_discarded_count() {
        let buffer = ReadingBuffer::new(10, OverflowPolicy::DropOldest);
        buffer.push(reading(1)).await;
        buffer.push(reading(2)).await;
        assert_eq!(buffer.clear().await, 2);
        assert_eq!(buffer.len().await, 0);
    }

    #[test]
    fn test_overflow_policy_deserializes_snake_case() {
        let policy: OverflowPolicy = serde_yaml::from_str("reject_newest").unwrap();
        assert_eq!(policy, OverflowPolicy::RejectNewest);
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::DropOldest);
    }
}
