//! # Progress Tracker
//!
//! In-memory progress of recalculation jobs, polled by job key.
//!
//! ```text
//! start ──► Pending ──► Running ──┬──► Completed
//!                         │       │
//!               processed += n    └──► Error (message; "cancelled" on cancel)
//! ```
//!
//! `processed` only moves forward; an update that would lower it is ignored.
//! Terminal records are never reopened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{RecalcError, RecalcResult};

/// Lifecycle state of a recalculation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Pollable progress of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub key: String,
    pub status: JobStatus,
    pub processed: u64,
    pub total: u64,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobProgress {
    fn new(key: String) -> Self {
        let now = Utc::now();
        JobProgress {
            key,
            status: JobStatus::Pending,
            processed: 0,
            total: 0,
            error: None,
            started_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// Completion in percent (0-100); 100 for an empty finished job.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return if self.status == JobStatus::Completed { 100 } else { 0 };
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }

    /// How the job ended, as a result: `Ok` unless it finished in `Error`.
    pub fn outcome(&self) -> RecalcResult<()> {
        if self.status != JobStatus::Error {
            return Ok(());
        }
        match self.error.as_deref() {
            Some(message) if message == RecalcError::Cancelled.to_string() => {
                Err(RecalcError::Cancelled)
            }
            message => Err(RecalcError::JobFailed {
                key: self.key.clone(),
                message: message.unwrap_or_default().to_string(),
            }),
        }
    }

    fn finish(&mut self, status: JobStatus, error: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.error = error;
        self.finished_at = Some(now);
        self.updated_at = now;
    }
}

/// Shared, cloneable registry of job progress.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    jobs: Arc<RwLock<HashMap<String, JobProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job in `Pending`.
    pub async fn create(&self, key: &str) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(key.to_string(), JobProgress::new(key.to_string()));
    }

    /// Current progress of a job, if known.
    pub async fn get_progress(&self, key: &str) -> Option<JobProgress> {
        self.jobs.read().await.get(key).cloned()
    }

    /// Marks a job running with its total order count.
    pub async fn start(&self, key: &str, total: u64) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(key) {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Running;
            job.total = total;
            job.updated_at = Utc::now();
        }
    }

    /// Raises the processed counter; never lowers it.
    pub async fn update(&self, key: &str, processed: u64) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(key) {
            if job.status.is_terminal() || processed <= job.processed {
                return;
            }
            job.processed = processed;
            job.updated_at = Utc::now();
        }
    }

    pub async fn complete(&self, key: &str) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(key) {
            if !job.status.is_terminal() {
                job.finish(JobStatus::Completed, None);
            }
        }
    }

    pub async fn fail(&self, key: &str, message: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(key) {
            if !job.status.is_terminal() {
                job.finish(JobStatus::Error, Some(message));
            }
        }
    }

    /// Drops finished jobs older than `max_age`. Active jobs are kept.
    pub async fn cleanup_finished(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age)
            .unwrap_or_else(|_| chrono::Duration::days(36_500));
        let now = Utc::now();

        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at {
            Some(finished_at) => now - finished_at < max_age,
            None => true,
        });
        before - jobs.len()
    }
}
