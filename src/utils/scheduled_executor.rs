// Scheduled Executor for periodic tasks
// Fixed-rate wall-clock grid, one tick at a time, late ticks dropped

use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// A trait for tasks that run periodically
pub trait ScheduledTask: Send + Sync + 'static {
    /// Execute the task
    /// Returns Ok(()) on success, Err on failure
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>>;

    /// Check if the task should terminate
    /// Default: never terminate (run forever)
    fn should_terminate(&self) -> bool {
        false
    }
}

/// Blanket implementation for Arc<T> where T: ScheduledTask
impl<T: ScheduledTask> ScheduledTask for Arc<T> {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        (**self).run()
    }

    fn should_terminate(&self) -> bool {
        (**self).should_terminate()
    }
}

/// What the executor does with a tick that has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Run,
    /// Woke up later than the misfire grace allows.
    Misfire { late_ms: i64 },
}

/// Decide whether a tick scheduled at `scheduled_ms` may still run at `now_ms`.
pub fn decide_tick(scheduled_ms: i64, now_ms: i64, misfire_grace_ms: i64) -> TickDecision {
    let late_ms = now_ms.saturating_sub(scheduled_ms);
    if late_ms > misfire_grace_ms {
        TickDecision::Misfire { late_ms }
    } else {
        TickDecision::Run
    }
}

/// First grid point strictly after `now_ms`, keeping the phase of `scheduled_ms`.
///
/// Ticks that fell due while the previous run was still in flight are skipped
/// rather than replayed.
pub fn next_fire_after(scheduled_ms: i64, now_ms: i64, interval_ms: i64) -> i64 {
    if interval_ms <= 0 {
        return now_ms;
    }
    if now_ms < scheduled_ms {
        return scheduled_ms;
    }
    let missed = (now_ms - scheduled_ms) / interval_ms + 1;
    scheduled_ms + missed * interval_ms
}

/// Scheduled executor for running periodic tasks
pub struct ScheduledExecutor {
    interval: Duration,
    misfire_grace: Duration,
    task_name: String,
    shutdown: Arc<AtomicBool>,
}

impl ScheduledExecutor {
    /// Create a new scheduled executor
    ///
    /// # Arguments
    /// * `task_name` - Name of the task (for logging)
    /// * `interval` - Interval between executions
    pub fn new(task_name: impl Into<String>, interval: Duration) -> Self {
        Self {
            task_name: task_name.into(),
            interval,
            misfire_grace: interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// How late a tick may start before it is dropped
    pub fn with_misfire_grace(mut self, grace: Duration) -> Self {
        self.misfire_grace = grace;
        self
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the task until `shutdown` is set or the task asks to terminate.
    ///
    /// Ticks never overlap: the loop awaits each run before computing the next
    /// fire time, and grid points that passed in the meantime are skipped.
    pub async fn start<T>(self, task: T)
    where
        T: ScheduledTask,
    {
        let task_name = self.task_name.clone();
        let interval_ms = self.interval.as_millis() as i64;
        let grace_ms = self.misfire_grace.as_millis() as i64;
        let shutdown = self.shutdown;

        tracing::info!(
            "Starting scheduled task '{}' with interval: {:?} (misfire grace {:?})",
            task_name,
            self.interval,
            self.misfire_grace
        );

        let mut next_execution = Utc::now().timestamp_millis() + interval_ms;

        loop {
            if shutdown.load(Ordering::Relaxed) || task.should_terminate() {
                tracing::info!("Scheduled task '{}' is shutting down", task_name);
                break;
            }

            let now = Utc::now().timestamp_millis();

            if now >= next_execution {
                match decide_tick(next_execution, now, grace_ms) {
                    TickDecision::Run => {
                        tracing::debug!("Executing scheduled task '{}'", task_name);
                        match task.run().await {
                            Ok(()) => {
                                tracing::debug!(
                                    "Scheduled task '{}' completed successfully",
                                    task_name
                                );
                            },
                            Err(e) => {
                                tracing::error!("Scheduled task '{}' failed: {}", task_name, e);
                            },
                        }
                    },
                    TickDecision::Misfire { late_ms } => {
                        tracing::warn!(
                            "Scheduled task '{}' missed its run by {}ms, skipping",
                            task_name,
                            late_ms
                        );
                    },
                }

                next_execution =
                    next_fire_after(next_execution, Utc::now().timestamp_millis(), interval_ms);
            }

            let wait_ms = next_execution.saturating_sub(Utc::now().timestamp_millis());
            if wait_ms > 0 {
                sleep(Duration::from_millis(wait_ms as u64)).await;
            }
        }

        tracing::info!("Scheduled task '{}' stopped", task_name);
    }
}
