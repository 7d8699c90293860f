//! # Recalculation Job
//!
//! Re-runs the order aggregator over every order of a tenant.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RecalcJob::start ──► tracker: Pending ──► spawn ──► return handle      │
//! │                                             │                           │
//! │                                             ▼                           │
//! │  OrderSource::load_orders ──► tracker: Running (total = n)             │
//! │        │                                                                │
//! │        ▼  for each batch of `batch_size`:                              │
//! │     cancelled? ──yes──► Error("cancelled")                             │
//! │        │                                                                │
//! │        ├──► split across ≤ `workers` spawn_blocking tasks              │
//! │        │      compute(order, RuleSnapshot) for each order              │
//! │        ├──► SnapshotSink::store_snapshots                              │
//! │        └──► tracker: processed += batch                                │
//! │                                                                         │
//! │  done ──► Completed        any failure ──► Error(message)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`RuleSnapshot`] is captured once when the job starts, so every order
//! of a run sees the same thresholds and fee rules.

use margin_core::{compute, ComputeContext, FinancialSnapshot, MarginSettings, Order, PaymentFeeRule};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RecalcConfig;
use crate::error::{RecalcError, RecalcResult};
use crate::progress::{JobProgress, ProgressTracker};
use crate::store::{OrderSource, SnapshotSink};

// =============================================================================
// Rule Snapshot
// =============================================================================

/// Tenant settings and fee rules frozen for one run.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub tenant_id: String,
    pub settings: MarginSettings,
    pub fee_rules: Vec<PaymentFeeRule>,
}

impl RuleSnapshot {
    /// Captures a snapshot after validating every fee rule.
    pub fn capture(
        tenant_id: impl Into<String>,
        settings: MarginSettings,
        fee_rules: Vec<PaymentFeeRule>,
    ) -> RecalcResult<Arc<Self>> {
        for rule in &fee_rules {
            rule.validate()?;
        }
        Ok(Arc::new(RuleSnapshot {
            tenant_id: tenant_id.into(),
            settings,
            fee_rules,
        }))
    }

    pub fn context(&self) -> ComputeContext<'_> {
        ComputeContext::new(&self.settings, &self.fee_rules)
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle to a running job.
pub struct RecalcHandle {
    key: String,
    cancelled: Arc<AtomicBool>,
    tracker: ProgressTracker,
    task: JoinHandle<()>,
}

impl RecalcHandle {
    /// Key the job's progress is published under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Requests cancellation; the job stops before its next batch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn progress(&self) -> Option<JobProgress> {
        self.tracker.get_progress(&self.key).await
    }

    /// Waits for the job to reach a terminal state.
    pub async fn wait(self) -> RecalcResult<JobProgress> {
        self.task.await?;
        let progress = self.tracker.get_progress(&self.key).await;
        progress.ok_or(RecalcError::JobNotFound(self.key))
    }
}

// =============================================================================
// Job
// =============================================================================

/// Everything a running job owns.
struct JobRun {
    key: String,
    source: Arc<dyn OrderSource>,
    sink: Arc<dyn SnapshotSink>,
    rules: Arc<RuleSnapshot>,
    batch_size: usize,
    workers: usize,
    cancelled: Arc<AtomicBool>,
    tracker: ProgressTracker,
}

pub struct RecalcJob;

impl RecalcJob {
    /// Progress key for a new run of a tenant.
    pub fn job_key(tenant_id: &str) -> String {
        format!("margin-recalc:{}:{}", tenant_id, Uuid::new_v4())
    }

    /// Registers and spawns a recalculation run.
    ///
    /// The progress record exists in `Pending` by the time this returns.
    pub async fn start(
        source: Arc<dyn OrderSource>,
        sink: Arc<dyn SnapshotSink>,
        rules: Arc<RuleSnapshot>,
        config: &RecalcConfig,
        tracker: ProgressTracker,
    ) -> RecalcHandle {
        let dropped = tracker.cleanup_finished(config.progress_ttl()).await;
        if dropped > 0 {
            debug!(dropped, "Dropped expired progress records");
        }

        let key = Self::job_key(&rules.tenant_id);
        tracker.create(&key).await;

        let cancelled = Arc::new(AtomicBool::new(false));
        let run = JobRun {
            key: key.clone(),
            source,
            sink,
            rules,
            batch_size: config.batch_size().max(1),
            workers: config.workers().max(1),
            cancelled: cancelled.clone(),
            tracker: tracker.clone(),
        };

        info!(
            key = %key,
            tenant_id = %run.rules.tenant_id,
            batch_size = run.batch_size,
            workers = run.workers,
            "Starting margin recalculation"
        );

        let task = tokio::spawn(async move {
            let key = run.key.clone();
            let tracker = run.tracker.clone();
            match run.execute().await {
                Ok(processed) => {
                    info!(key = %key, processed, "Margin recalculation completed");
                    tracker.complete(&key).await;
                }
                Err(e) if e.is_cancellation() => {
                    warn!(key = %key, "Margin recalculation cancelled");
                    tracker.fail(&key, e.to_string()).await;
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Margin recalculation failed");
                    tracker.fail(&key, e.to_string()).await;
                }
            }
        });

        RecalcHandle {
            key,
            cancelled,
            tracker,
            task,
        }
    }
}

impl JobRun {
    async fn execute(&self) -> RecalcResult<u64> {
        let orders = self.source.load_orders(&self.rules.tenant_id).await?;
        let total = orders.len() as u64;
        self.tracker.start(&self.key, total).await;

        let mut remaining = orders.into_iter();
        let mut processed = 0u64;
        let mut batch_index = 0usize;

        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(RecalcError::Cancelled);
            }

            let batch: Vec<Order> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len() as u64;

            let snapshots = self.compute_batch(batch).await?;
            self.sink.store_snapshots(snapshots).await?;

            processed += batch_len;
            batch_index += 1;
            self.tracker.update(&self.key, processed).await;
            debug!(key = %self.key, batch = batch_index, processed, total, "Batch stored");
        }

        Ok(processed)
    }

    /// Computes one batch across at most `workers` blocking tasks, keeping order.
    async fn compute_batch(&self, batch: Vec<Order>) -> RecalcResult<Vec<FinancialSnapshot>> {
        let chunk_size = batch.len().div_ceil(self.workers).max(1);

        let mut chunks = batch.into_iter();
        let mut tasks = Vec::with_capacity(self.workers);
        loop {
            let chunk: Vec<Order> = chunks.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let rules = self.rules.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                let ctx = rules.context();
                chunk.iter().map(|order| compute(order, &ctx)).collect::<Vec<_>>()
            }));
        }

        let mut snapshots = Vec::new();
        for task in tasks {
            snapshots.extend(task.await?);
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::JobStatus;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn orders(n: usize) -> Vec<Order> {
        (0..n)
            .map(|i| {
                serde_json::from_value(json!({
                    "id": format!("o-{i}"),
                    "tenant_id": "t1",
                    "total": 1000 + i as i64
                }))
                .unwrap()
            })
            .collect()
    }

    fn config(batch_size: usize, workers: usize) -> RecalcConfig {
        let mut config = RecalcConfig::default();
        config.job.batch_size = batch_size;
        config.job.workers = workers;
        config
    }

    #[test]
    fn test_job_keys_are_unique_per_run() {
        let a = RecalcJob::job_key("t1");
        let b = RecalcJob::job_key("t1");
        assert_ne!(a, b);
        assert!(a.starts_with("margin-recalc:t1:"));
    }

    #[test]
    fn test_capture_rejects_invalid_rule() {
        let rule: PaymentFeeRule = serde_json::from_value(json!({
            "id": "bad",
            "payment_type": "online",
            "fee_type": "percentage",
            "fee_value": 20000
        }))
        .unwrap();
        let err = RuleSnapshot::capture("t1", MarginSettings::default(), vec![rule]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let store = Arc::new(InMemoryStore::new(orders(7)));
        let rules = RuleSnapshot::capture("t1", MarginSettings::default(), vec![]).unwrap();
        let tracker = ProgressTracker::new();

        let handle = RecalcJob::start(store.clone(), store.clone(), rules, &config(3, 2), tracker).await;
        let progress = handle.wait().await.unwrap();

        assert_eq!(progress.status, JobStatus::Completed);
        assert_eq!(progress.processed, 7);
        assert_eq!(store.batch_count().await, 3);

        let ids: Vec<String> = store.snapshots().await.into_iter().map(|s| s.order_id).collect();
        let expected: Vec<String> = (0..7).map(|i| format!("o-{i}")).collect();
        assert_eq!(ids, expected);
    }
}
