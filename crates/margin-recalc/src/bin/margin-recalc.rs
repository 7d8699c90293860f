//! # margin-recalc
//!
//! Computes financial snapshots for a JSON file of orders.
//!
//! ```text
//! margin-recalc orders.json [--config recalc.toml] [--tenant t1]
//!
//! orders.json ──► InMemoryStore ──► RecalcJob ──► stdout
//! {                                               {
//!   "tenant_id": "t1",                              "job": { status, processed, ... },
//!   "settings": { margin_poor, ... },   (opt.)      "snapshots": [ ... ],
//!   "fee_rules": [ ... ],                           "indicators": { ... }
//!   "orders": [ ... ]                             }
//! }
//! ```
//!
//! Logs go to stderr; filter with `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use margin_core::{summarize, FinancialSnapshot, MarginSettings, Order, OrderIndicators, PaymentFeeRule};
use margin_recalc::{
    InMemoryStore, JobProgress, ProgressTracker, RecalcConfig, RecalcError, RecalcJob,
    RuleSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "margin-recalc", about = "Compute order margins for a JSON file of orders")]
struct Args {
    /// Input file with settings, fee rules and orders.
    input: PathBuf,

    /// Config file (defaults to recalc.toml in the platform config dir).
    #[arg(long, env = "MARGIN_RECALC_CONFIG")]
    config: Option<PathBuf>,

    /// Tenant to recalculate; overrides the input file's tenant_id.
    #[arg(long)]
    tenant: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Input {
    #[serde(default)]
    tenant_id: String,
    /// Falls back to the configured default margins.
    #[serde(default)]
    settings: Option<MarginSettings>,
    #[serde(default)]
    fee_rules: Vec<PaymentFeeRule>,
    #[serde(default)]
    orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
struct Output {
    job: JobProgress,
    snapshots: Vec<FinancialSnapshot>,
    indicators: OrderIndicators,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();
    let config = RecalcConfig::load(args.config)?;
    info!(
        batch_size = config.batch_size(),
        workers = config.workers(),
        "Configuration loaded"
    );

    let contents = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|e| RecalcError::SourceFailed(format!("{}: {}", args.input.display(), e)))?;
    let input: Input = serde_json::from_str(&contents)?;

    let tenant_id = args.tenant.unwrap_or(input.tenant_id);
    let settings = match input.settings {
        Some(settings) => settings,
        None => {
            info!("No tenant settings in input, using configured defaults");
            config.default_margins.to_settings()?
        }
    };

    let orders: Vec<Order> = input
        .orders
        .into_iter()
        .map(|mut order| {
            if order.tenant_id.is_empty() {
                order.tenant_id = tenant_id.clone();
            }
            order
        })
        .collect();
    info!(tenant_id = %tenant_id, orders = orders.len(), "Input loaded");
    warn_invalid_products(&orders);

    let store = Arc::new(InMemoryStore::new(orders));
    let rules = RuleSnapshot::capture(tenant_id, settings, input.fee_rules)?;
    let tracker = ProgressTracker::new();

    let handle =
        RecalcJob::start(store.clone(), store.clone(), rules, &config, tracker.clone()).await;
    let poll = tokio::spawn(report_progress(handle.key().to_string(), tracker));
    let job = handle.wait().await?;
    poll.abort();

    let outcome = job.outcome();
    if let Err(e) = &outcome {
        warn!(error = %e, "Recalculation did not complete");
    }

    let snapshots = store.snapshots().await;
    let output = Output {
        job,
        indicators: summarize(&snapshots),
        snapshots,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    // Partial output is still printed; the exit status reports the failure.
    outcome?;
    Ok(())
}

/// Logs mapped products a product editor would have rejected.
///
/// The aggregator still computes them as given.
fn warn_invalid_products(orders: &[Order]) {
    for order in orders {
        let mappings = order.items.iter().flat_map(|item| {
            item.mapping
                .iter()
                .chain(item.add_ons.iter().filter_map(|a| a.mapping.as_ref()))
        });
        for mapping in mappings {
            if let Err(e) = mapping.product.validate() {
                warn!(
                    order_id = %order.id,
                    product_id = %mapping.product.id,
                    error = %e,
                    "Invalid product mapping"
                );
            }
        }
    }
}

/// Logs progress once a second until the job finishes.
async fn report_progress(key: String, tracker: ProgressTracker) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        match tracker.get_progress(&key).await {
            Some(p) if !p.status.is_terminal() => {
                info!(processed = p.processed, total = p.total, percent = p.percent(), "Progress");
            }
            _ => break,
        }
    }
}
