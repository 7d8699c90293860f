//! # Order Aggregator
//!
//! Computes an order's financial snapshot from its items, the tenant's fee
//! rules and margin settings.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order ───┬──► for each item: Cost Resolver ──► total_cost             │
//! │           │                   Tax Resolver  ──► total_tax              │
//! │           │                                                             │
//! │           ├──► extra_costs ───────────────────► extra_cost             │
//! │           │                                                             │
//! │           ├──► order total (stored → payload → items)                  │
//! │           │         │                                                   │
//! │           │         ▼                                                   │
//! │           └──► Fee Resolver (once) ───────────► total_commissions      │
//! │                                                                         │
//! │  net_total = order_total - cost - tax - extra - commissions            │
//! │  margin    = net_total / order_total ──► Margin Classifier ──► band    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - **Total**: never fails; missing money is zero, missing categories are
//!   `unmapped` / `others`.
//! - **Idempotent**: integer arithmetic only, so re-running on unchanged input
//!   yields an identical snapshot.
//! - **Pure**: settings and rules are passed in through [`ComputeContext`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cost::resolve_item_cost;
use crate::fees::{resolve_fee, FeeOutcome, PaymentFeeRule};
use crate::margin::{classify, margin_percentage, MarginBand, MarginSettings};
use crate::money::{Money, Percentage};
use crate::payload::{extract_payment, extract_status, extract_total};
use crate::tax::resolve_item_tax;
use crate::types::{Order, OrderStatus, PaymentInfo, Provider};

// =============================================================================
// Context
// =============================================================================

/// Tenant configuration one computation reads. Borrowed, never global.
#[derive(Debug, Clone, Copy)]
pub struct ComputeContext<'a> {
    pub settings: &'a MarginSettings,
    pub fee_rules: &'a [PaymentFeeRule],
}

impl<'a> ComputeContext<'a> {
    pub fn new(settings: &'a MarginSettings, fee_rules: &'a [PaymentFeeRule]) -> Self {
        ComputeContext { settings, fee_rules }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Computed financials of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSnapshot {
    pub order_id: String,
    #[ts(as = "String")]
    pub provider: Provider,
    pub status: OrderStatus,
    pub order_total: Money,
    /// CMV.
    pub total_cost: Money,
    pub total_tax: Money,
    pub extra_cost: Money,
    pub total_commissions: Money,
    pub net_total: Money,
    pub margin_percentage: Percentage,
    pub margin_band: MarginBand,
    pub payment: FeeOutcome,
    /// Items whose main line has no internal product.
    pub unmapped_items: Vec<String>,
    /// Add-ons with no internal product.
    pub unmapped_add_ons: Vec<String>,
    /// Display-only; excluded from indicator sums.
    pub cancelled: bool,
}

impl FinancialSnapshot {
    /// Checks if any item or add-on still needs a mapping.
    pub fn has_unmapped(&self) -> bool {
        !self.unmapped_items.is_empty() || !self.unmapped_add_ons.is_empty()
    }

    /// Recomputes net total from its parts.
    pub fn expected_net_total(&self) -> Money {
        self.order_total - self.total_cost - self.total_tax - self.extra_cost - self.total_commissions
    }
}

// =============================================================================
// Order-Level Fallbacks
// =============================================================================

/// The order's status, falling back to the payload when not normalized yet.
pub fn effective_status(order: &Order) -> OrderStatus {
    match order.status {
        OrderStatus::Unknown => extract_status(order.provider, &order.payload),
        status => status,
    }
}

/// The order total: stored value, then payload, then item revenue.
pub fn order_total(order: &Order) -> Money {
    order
        .total
        .or_else(|| extract_total(order.provider, &order.payload))
        .unwrap_or_else(|| order.items_revenue())
}

/// Payment fields: stored values when present, payload otherwise.
pub fn payment_info(order: &Order) -> PaymentInfo {
    match &order.payment {
        Some(payment) if !payment.is_empty() => payment.clone(),
        _ => extract_payment(order.provider, &order.payload),
    }
}

// =============================================================================
// Computation
// =============================================================================

/// Computes the financial snapshot of one order.
///
/// ## Example
/// ```rust
/// use margin_core::aggregator::{compute, ComputeContext};
/// use margin_core::margin::MarginSettings;
/// use margin_core::money::Money;
/// use margin_core::types::Order;
///
/// let order: Order = serde_json::from_value(serde_json::json!({
///     "id": "o-1",
///     "total": 10000,
///     "items": [{ "id": "i-1", "quantity": 1, "unit_price": 10000 }]
/// })).unwrap();
///
/// let settings = MarginSettings::default();
/// let snapshot = compute(&order, &ComputeContext::new(&settings, &[]));
/// assert_eq!(snapshot.net_total, Money::from_cents(10000));
/// assert_eq!(snapshot.unmapped_items, vec!["i-1".to_string()]);
/// ```
pub fn compute(order: &Order, ctx: &ComputeContext<'_>) -> FinancialSnapshot {
    let status = effective_status(order);
    let cancelled = status.is_cancelled();

    let mut total_cost = Money::zero();
    let mut total_tax = Money::zero();
    let mut unmapped_items = Vec::new();
    let mut unmapped_add_ons = Vec::new();

    for item in &order.items {
        let item_cost = resolve_item_cost(item);
        total_cost += item_cost.cost;
        total_tax += resolve_item_tax(item);

        if item_cost.unmapped {
            unmapped_items.push(item_cost.item_id);
        }
        unmapped_add_ons.extend(item_cost.unmapped_add_ons);
    }

    let order_total = order_total(order);
    let extra_cost = order.extra_cost();
    let payment = resolve_fee(&payment_info(order), order.provider, order_total, ctx.fee_rules);
    let total_commissions = payment.fee;

    let net_total = order_total - total_cost - total_tax - extra_cost - total_commissions;
    let margin = margin_percentage(net_total, order_total);
    let margin_band = classify(margin, ctx.settings, cancelled);

    FinancialSnapshot {
        order_id: order.id.clone(),
        provider: order.provider,
        status,
        order_total,
        total_cost,
        total_tax,
        extra_cost,
        total_commissions,
        net_total,
        margin_percentage: margin,
        margin_band,
        payment,
        unmapped_items,
        unmapped_add_ons,
        cancelled,
    }
}

/// Computes snapshots for a slice of orders with one context.
pub fn compute_all(orders: &[Order], ctx: &ComputeContext<'_>) -> Vec<FinancialSnapshot> {
    orders.iter().map(|order| compute(order, ctx)).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: serde_json::Value) -> Order {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_total_falls_back_to_payload_then_items() {
        let from_payload = order(json!({
            "id": "a",
            "provider": "ifood",
            "payload": { "total": { "orderAmount": 55.5 } },
            "items": [{ "unit_price": 100 }]
        }));
        assert_eq!(order_total(&from_payload).cents(), 5550);

        let from_items = order(json!({
            "id": "b",
            "items": [{ "quantity": 2, "unit_price": 1500 }]
        }));
        assert_eq!(order_total(&from_items).cents(), 3000);
    }

    #[test]
    fn test_status_falls_back_to_payload() {
        let o = order(json!({ "id": "a", "provider": "ifood", "payload": { "fullCode": "CAN" } }));
        assert_eq!(effective_status(&o), OrderStatus::Cancelled);

        let stored = order(json!({ "id": "b", "status": "concluded", "payload": { "status": "canceled" } }));
        assert_eq!(effective_status(&stored), OrderStatus::Concluded);
    }

    #[test]
    fn test_stored_payment_wins_over_payload() {
        let o = order(json!({
            "id": "a",
            "provider": "takeat",
            "payment": { "method_name": "Dinheiro" },
            "payload": { "payments": [{ "payment_method": { "keyword": "pix" } }] }
        }));
        assert_eq!(payment_info(&o).method_name.as_deref(), Some("Dinheiro"));

        let empty = order(json!({
            "id": "b",
            "provider": "takeat",
            "payment": {},
            "payload": { "payments": [{ "payment_method": { "keyword": "pix" } }] }
        }));
        assert_eq!(payment_info(&empty).method.as_deref(), Some("pix"));
    }

    #[test]
    fn test_empty_order_is_neutral() {
        let settings = MarginSettings::default();
        let snap = compute(&order(json!({ "id": "empty" })), &ComputeContext::new(&settings, &[]));
        assert!(snap.order_total.is_zero());
        assert!(snap.net_total.is_zero());
        assert_eq!(snap.margin_band, MarginBand::Neutral);
        assert!(snap.payment.is_unmatched());
    }

    #[test]
    fn test_extra_costs_reduce_net() {
        let settings = MarginSettings::default();
        let snap = compute(
            &order(json!({
                "id": "x",
                "total": 10000,
                "extra_costs": [{ "label": "Embalagem", "amount": 150 }, { "label": "Entrega", "amount": 700 }]
            })),
            &ComputeContext::new(&settings, &[]),
        );
        assert_eq!(snap.extra_cost.cents(), 850);
        assert_eq!(snap.net_total.cents(), 9150);
        assert_eq!(snap.net_total, snap.expected_net_total());
    }
}
