//! KPI Sampler
//!
//! Scheduled task that collects one KPI sample per tick and appends it to the
//! history store when both CPU and memory were measured.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::services::history_store::HistoryStore;
use crate::services::kpi_collector::KpiCollector;
use crate::utils::scheduled_executor::ScheduledTask;

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Persisted { id: i64 },
    /// Collection failed or CPU/memory were not numeric
    Discarded { reason: String },
    /// Another tick was still in flight
    Skipped,
}

pub struct KpiSampler {
    collector: Arc<KpiCollector>,
    history: HistoryStore,
    in_flight: AtomicBool,
}

impl KpiSampler {
    pub fn new(collector: Arc<KpiCollector>, history: HistoryStore) -> Self {
        Self { collector, history, in_flight: AtomicBool::new(false) }
    }

    /// Whether a tick is currently in flight
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn tick(&self) -> Result<SampleOutcome, anyhow::Error> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("Previous KPI sample still running, skipping this tick");
            return Ok(SampleOutcome::Skipped);
        };

        self.sample().await
    }

    async fn sample(&self) -> Result<SampleOutcome, anyhow::Error> {
        tracing::info!("Running scheduled KPI logging job...");
        let sample = self.collector.fetch().await;

        let Some((cpu, memory)) = sample.persistable() else {
            let reason = match &sample.collection_error {
                Some(err) => err.clone(),
                None => format!(
                    "incomplete sample (cpu={:?}, memory={:?})",
                    sample.cpu_usage_percent, sample.memory_usage.used
                ),
            };
            tracing::info!("KPI sample discarded: {}", reason);
            return Ok(SampleOutcome::Discarded { reason });
        };

        let id = self
            .history
            .append(cpu, memory)
            .await
            .map_err(|e| anyhow::anyhow!("failed to persist KPI sample: {}", e))?;

        tracing::info!("KPIs successfully logged to database (id={})", id);
        Ok(SampleOutcome::Persisted { id })
    }
}

/// Holds the single-flight flag; released on drop, so an aborted tick
/// does not block the following ones.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ScheduledTask for KpiSampler {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        Box::pin(async move { self.tick().await.map(|_| ()) })
    }
}
