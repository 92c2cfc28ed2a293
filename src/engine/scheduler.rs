// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Periodic task runner driving south ingest and north egress cycles.
//!
//! Each [`ScheduledTask`] owns one tokio task that ticks at the service's
//! interval and runs one cycle of its [`Runnable`] per tick while enabled.
//!
//! # States
//!
//! ```text
//!            enable                 tick
//! Disabled ─────────▶ Idle ─────────────────▶ Running
//!    ▲                 ▲  ◀──── cycle done ───────┘
//!    └──── disable ────┘ (waits for the running cycle)
//!
//! any state ── remove ──▶ Removed (terminal)
//! ```
//!
//! A cycle that has started always runs to completion. Disabling or stopping
//! a task waits for it rather than cancelling it, so a send is never cut off
//! half way and the readings it drained are either delivered or requeued.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as CycleLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One unit of periodic work.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn run_once(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    Disabled,
    Idle,
    Running,
    Removed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskState::Disabled => "disabled",
            TaskState::Idle => "idle",
            TaskState::Running => "running",
            TaskState::Removed => "removed",
        };
        write!(f, "{}", text)
    }
}

/// Point-in-time view of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleInfo {
    pub id: Uuid,
    pub service: String,
    pub interval: Duration,
    pub enabled: bool,
    pub state: TaskState,
}

pub struct ScheduledTask {
    id: Uuid,
    service: String,
    interval: Duration,
    enabled: AtomicBool,
    state: Mutex<TaskState>,
    cycle: CycleLock<()>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduledTask {
    /// Start ticking `job` every `interval`. The first tick is immediate.
    pub fn spawn(
        id: Uuid,
        service: impl Into<String>,
        interval: Duration,
        enabled: bool,
        job: Arc<dyn Runnable>,
    ) -> Arc<Self> {
        let initial = if enabled { TaskState::Idle } else { TaskState::Disabled };
        let task = Arc::new(Self {
            id,
            service: service.into(),
            interval: interval.max(Duration::from_millis(1)),
            enabled: AtomicBool::new(enabled),
            state: Mutex::new(initial),
            cycle: CycleLock::new(()),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        });

        let handle = tokio::spawn(Self::run(Arc::clone(&task), job));
        *task.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        task
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn info(&self) -> ScheduleInfo {
        ScheduleInfo {
            id: self.id,
            service: self.service.clone(),
            interval: self.interval,
            enabled: self.is_enabled(),
            state: self.state(),
        }
    }

    /// Resume dispatch from the next tick.
    pub fn enable(&self) {
        if self.state() == TaskState::Removed {
            return;
        }
        self.enabled.store(true, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == TaskState::Disabled {
            *state = TaskState::Idle;
        }
    }

    /// Suspend dispatch. Returns once no cycle is running.
    pub async fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        let _cycle = self.cycle.lock().await;
        self.transition(TaskState::Disabled);
    }

    pub async fn set_enabled(&self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable().await;
        }
    }

    /// Stop the task for good, after any running cycle.
    ///
    /// The enabled flag is kept so a restarted platform resumes the schedule
    /// in the state it had.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(service = %self.service, error = %e, "Scheduled task ended abnormally");
            }
        }
    }

    /// Stop the task and mark it `Removed`.
    pub async fn remove(&self) {
        self.stop().await;
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = TaskState::Removed;
    }

    async fn run(self: Arc<Self>, job: Arc<dyn Runnable>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !self.is_enabled() {
                continue;
            }

            let _cycle = self.cycle.lock().await;
            if self.cancel.is_cancelled() {
                break;
            }
            if !self.is_enabled() {
                continue;
            }

            self.transition(TaskState::Running);
            job.run_once().await;
            let after = if self.is_enabled() { TaskState::Idle } else { TaskState::Disabled };
            self.transition(after);
        }

        tracing::debug!(service = %self.service, schedule_id = %self.id, "Scheduled task stopped");
    }

    fn transition(&self, next: TaskState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != TaskState::Removed {
            *state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingJob {
        runs: AtomicUsize,
        in_flight: AtomicBool,
        duration: Duration,
    }

    impl CountingJob {
        fn new(duration: Duration) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicUsize::new(0),
                in_flight: AtomicBool::new(false),
                duration,
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Runnable for CountingJob {
        async fn run_once(&self) {
            self.in_flight.store(true, Ordering::SeqCst);
            tokio::time::sleep(self.duration).await;
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met in time");
    }

    #[tokio::test]
    async fn test_runs_periodically_while_enabled() {
        let job = CountingJob::new(Duration::ZERO);
        let task = ScheduledTask::spawn(Uuid::new_v4(), "svc", Duration::from_millis(20), true, job.clone());

        wait_for(|| job.runs() >= 3).await;
        assert!(task.is_enabled());
        task.stop().await;
    }

    #[tokio::test]
    async fn test_created_disabled_does_not_run() {
        let job = CountingJob::new(Duration::ZERO);
        let task = ScheduledTask::spawn(Uuid::new_v4(), "svc", Duration::from_millis(10), false, job.clone());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(job.runs(), 0);
        assert_eq!(task.state(), TaskState::Disabled);

        task.enable();
        assert_eq!(task.state(), TaskState::Idle);
        wait_for(|| job.runs() >= 1).await;
        task.stop().await;
    }

    #[tokio::test]
    async fn test_disable_waits_for_running_cycle() {
        let job = CountingJob::new(Duration::from_millis(80));
        let task = ScheduledTask::spawn(Uuid::new_v4(), "svc", Duration::from_millis(10), true, job.clone());

        wait_for(|| job.in_flight.load(Ordering::SeqCst)).await;
        task.disable().await;

        assert!(!job.in_flight.load(Ordering::SeqCst));
        assert_eq!(task.state(), TaskState::Disabled);
        let runs = job.runs();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(job.runs(), runs);

        task.enable();
        wait_for(|| job.runs() > runs).await;
        task.stop().await;
    }

    #[tokio::test]
    async fn test_remove_is_terminal() {
        let job = CountingJob::new(Duration::ZERO);
        let task = ScheduledTask::spawn(Uuid::new_v4(), "svc", Duration::from_millis(10), true, job.clone());
        wait_for(|| job.runs() >= 1).await;

        task.remove().await;
        assert_eq!(task.state(), TaskState::Removed);

        task.enable();
        let runs = job.runs();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(job.runs(), runs);
        assert_eq!(task.state(), TaskState::Removed);
    }

    #[tokio::test]
    async fn test_info_reflects_schedule() {
        let id = Uuid::new_v4();
        let job = CountingJob::new(Duration::ZERO);
        let task = ScheduledTask::spawn(id, "Archive", Duration::from_millis(500), false, job);

        let info = task.info();
        assert_eq!(info.id, id);
        assert_eq!(info.service, "Archive");
        assert_eq!(info.interval, Duration::from_millis(500));
        assert!(!info.enabled);
        assert_eq!(info.state, TaskState::Disabled);
        task.stop().await;
    }
}
