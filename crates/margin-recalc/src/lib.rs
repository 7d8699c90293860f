//! # margin-recalc: Batch Margin Recalculation
//!
//! Re-runs [`margin_core::compute`] over a tenant's orders after its margin
//! thresholds, fee rules or product costs change.
//!
//! ## Modules
//! - [`config`] - RecalcConfig (TOML file + environment)
//! - [`error`] - RecalcError
//! - [`job`] - RecalcJob, RecalcHandle, RuleSnapshot
//! - [`progress`] - ProgressTracker polled by job key
//! - [`store`] - OrderSource / SnapshotSink seams and an in-memory store
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use margin_recalc::{InMemoryStore, ProgressTracker, RecalcConfig, RecalcJob, RuleSnapshot};
//!
//! # async fn run(settings: margin_core::MarginSettings) -> margin_recalc::RecalcResult<()> {
//! let store = Arc::new(InMemoryStore::default());
//! let rules = RuleSnapshot::capture("tenant-1", settings, vec![])?;
//! let config = RecalcConfig::load_or_default(None);
//!
//! let handle = RecalcJob::start(store.clone(), store, rules, &config, ProgressTracker::new()).await;
//! println!("polling {}", handle.key());
//! let progress = handle.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod progress;
pub mod store;

pub use config::RecalcConfig;
pub use error::{RecalcError, RecalcResult};
pub use job::{RecalcHandle, RecalcJob, RuleSnapshot};
pub use progress::{JobProgress, JobStatus, ProgressTracker};
pub use store::{InMemoryStore, OrderSource, SnapshotSink};
