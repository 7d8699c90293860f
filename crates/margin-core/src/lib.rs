//! # margin-core: Order Profitability Computation
//!
//! This crate turns a delivery-platform order into its financial snapshot:
//! cost of goods (CMV), tax, payment fees, extra costs, net total and a
//! margin band. Everything here is a pure function of its inputs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Margin Engine                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Platforms (iFood, Takeat, 99Food) ──► raw orders        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ margin-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │   cost   │ │   tax    │ │   fees   │ │     margin       │  │   │
//! │  │   │ mapping  │ │ category │ │ rules +  │ │ settings + band  │  │   │
//! │  │   │ × portion│ │ × revenue│ │ payment  │ │                  │  │   │
//! │  │   └────┬─────┘ └────┬─────┘ └────┬─────┘ └────────┬─────────┘  │   │
//! │  │        └────────────┴─────┬──────┴────────────────┘            │   │
//! │  │                     aggregator ──► FinancialSnapshot            │   │
//! │  │                           │                                     │   │
//! │  │                      indicators ──► dashboard totals            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          margin-recalc (batch jobs, progress, config)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money, Percentage and Portion (integers only)
//! - [`types`] - Domain types (Order, OrderItem, InternalProduct, etc.)
//! - [`error`] - Domain error types
//! - [`validation`] - Settings and field validation
//! - [`payload`] - Tolerant readers over raw provider JSON
//! - [`cost`] - Cost Resolver
//! - [`tax`] - Tax Resolver
//! - [`payment`] - Payment method and type classification
//! - [`fees`] - Fee rules and the Fee/Commission Resolver
//! - [`margin`] - Margin settings and the Margin Classifier
//! - [`aggregator`] - Order Aggregator
//! - [`indicators`] - Dashboard totals over many snapshots
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same order + same settings = same snapshot, bit for bit
//! 2. **No I/O**: tenant settings and rules are passed in, never looked up
//! 3. **Integer Money**: cents, basis points and ten-thousandths
//! 4. **Total**: missing data degrades to zero / `unmapped` / `others`
//!
//! ## Example Usage
//!
//! ```rust
//! use margin_core::{compute, ComputeContext, MarginBand, MarginSettings, Order};
//!
//! let order: Order = serde_json::from_value(serde_json::json!({
//!     "id": "order-1",
//!     "status": "concluded",
//!     "total": 10000,
//!     "items": [{
//!         "id": "item-1",
//!         "quantity": 1,
//!         "unit_price": 10000,
//!         "mapping": {
//!             "product": {
//!                 "id": "p-1",
//!                 "unit_cost": 3000,
//!                 "tax_category": { "total_tax_rate": 1000 }
//!             }
//!         }
//!     }]
//! })).unwrap();
//!
//! let settings = MarginSettings::from_percentages(0.0, 30.0, 99.99, 100.0).unwrap();
//! let snapshot = compute(&order, &ComputeContext::new(&settings, &[]));
//!
//! assert_eq!(snapshot.net_total.cents(), 6000);
//! assert_eq!(snapshot.margin_percentage.bps(), 6000);
//! assert_eq!(snapshot.margin_band, MarginBand::Good);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod cost;
pub mod error;
pub mod fees;
pub mod indicators;
pub mod margin;
pub mod money;
pub mod payload;
pub mod payment;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::{compute, compute_all, ComputeContext, FinancialSnapshot};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fees::{FeeCategory, FeeOutcome, FeeType, PaymentFeeRule};
pub use indicators::{summarize, OrderIndicators};
pub use margin::{MarginBand, MarginSettings};
pub use money::{Money, Percentage, Portion};
pub use payment::{CanonicalMethod, PaymentType};
pub use types::*;
