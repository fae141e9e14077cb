//! Scheduled side effects.
//!
//! A delayed effect is an explicit value handed to the scheduler; delivery
//! runs on its own task, never blocks dispatch, and delivery failures are
//! logged rather than surfaced to the original caller.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Injectable clock for deterministic scheduling tests.
pub trait Clock: Send + Sync {
    /// Milliseconds since epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock implementation.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// One scheduled delivery: payload plus due time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub user_id: String,
    pub message: String,
    /// Milliseconds since epoch.
    pub due_at: i64,
}

/// Delivery target for due tasks.
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn deliver(&self, task: &ScheduledTask) -> Result<()>;
}

/// Tokio-based scheduler: sleeps until due, then delivers.
pub struct ReminderScheduler {
    sink: Arc<dyn ReminderSink>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(sink: Arc<dyn ReminderSink>) -> Self {
        Self::with_clock(sink, Arc::new(SystemClock))
    }

    pub fn with_clock(sink: Arc<dyn ReminderSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    /// Build a task due `delay` from now.
    pub fn task_in(&self, user_id: impl Into<String>, message: impl Into<String>, delay: Duration) -> ScheduledTask {
        ScheduledTask {
            user_id: user_id.into(),
            message: message.into(),
            due_at: self.clock.now_millis() + delay.as_millis() as i64,
        }
    }

    /// Hand a task off for delivery. Returns immediately.
    pub fn schedule(&self, task: ScheduledTask) {
        let sink = self.sink.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            let wait_ms = (task.due_at - clock.now_millis()).max(0) as u64;
            if wait_ms > 0 {
                tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            }
            debug!(user_id = %task.user_id, "delivering scheduled task");
            if let Err(e) = sink.deliver(&task).await {
                warn!(user_id = %task.user_id, error = %e, "scheduled delivery failed");
            }
        });
    }
}
