//! # Dashboard Indicators
//!
//! Aggregate figures shown above the orders table.
//!
//! Cancelled orders are counted but never summed: a cancelled R$100.00 order
//! does not add R$100.00 to "total faturado".

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregator::FinancialSnapshot;
use crate::margin::{margin_percentage, MarginBand};
use crate::money::{Money, Percentage};

/// Orders per margin band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BandCounts {
    pub excellent: u64,
    pub good: u64,
    pub poor: u64,
    pub neutral: u64,
    pub not_applicable: u64,
}

impl BandCounts {
    fn record(&mut self, band: MarginBand) {
        let slot = match band {
            MarginBand::Excellent => &mut self.excellent,
            MarginBand::Good => &mut self.good,
            MarginBand::Poor => &mut self.poor,
            MarginBand::Neutral => &mut self.neutral,
            MarginBand::NotApplicable => &mut self.not_applicable,
        };
        *slot += 1;
    }
}

/// Aggregates over a set of order snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderIndicators {
    pub order_count: u64,
    pub cancelled_count: u64,
    /// Total faturado.
    pub total_billed: Money,
    pub total_cost: Money,
    pub total_tax: Money,
    pub total_commissions: Money,
    pub extra_cost: Money,
    pub net_total: Money,
    pub average_ticket: Money,
    pub margin_percentage: Percentage,
    pub bands: BandCounts,
    /// Orders with at least one unmapped item or add-on.
    pub unmapped_orders: u64,
}

impl OrderIndicators {
    /// Orders that contribute to the monetary sums.
    pub fn billable_count(&self) -> u64 {
        self.order_count - self.cancelled_count
    }
}

/// Summarizes snapshots into dashboard indicators.
///
/// ## Example
/// ```rust
/// use margin_core::indicators::summarize;
///
/// let indicators = summarize(&[]);
/// assert_eq!(indicators.order_count, 0);
/// assert!(indicators.total_billed.is_zero());
/// ```
pub fn summarize(snapshots: &[FinancialSnapshot]) -> OrderIndicators {
    let mut out = OrderIndicators::default();

    for snap in snapshots {
        out.order_count += 1;
        out.bands.record(snap.margin_band);
        if snap.has_unmapped() {
            out.unmapped_orders += 1;
        }

        if snap.cancelled {
            out.cancelled_count += 1;
            continue;
        }

        out.total_billed += snap.order_total;
        out.total_cost += snap.total_cost;
        out.total_tax += snap.total_tax;
        out.total_commissions += snap.total_commissions;
        out.extra_cost += snap.extra_cost;
        out.net_total += snap.net_total;
    }

    out.average_ticket = out.total_billed.average_over(out.billable_count() as i64);
    out.margin_percentage = margin_percentage(out.net_total, out.total_billed);
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{compute, ComputeContext};
    use crate::margin::MarginSettings;
    use crate::types::Order;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> FinancialSnapshot {
        let order: Order = serde_json::from_value(value).unwrap();
        let settings = MarginSettings::default();
        compute(&order, &ComputeContext::new(&settings, &[]))
    }

    #[test]
    fn test_cancelled_orders_are_counted_not_summed() {
        let snaps = vec![
            snapshot(json!({ "id": "a", "status": "concluded", "total": 10000 })),
            snapshot(json!({ "id": "b", "status": "cancelled", "total": 10000 })),
        ];
        let ind = summarize(&snaps);

        assert_eq!(ind.order_count, 2);
        assert_eq!(ind.cancelled_count, 1);
        assert_eq!(ind.total_billed.cents(), 10000);
        assert_eq!(ind.average_ticket.cents(), 10000);
        assert_eq!(ind.bands.not_applicable, 1);
    }

    #[test]
    fn test_aggregate_margin_uses_sums() {
        let snaps = vec![
            snapshot(json!({
                "id": "a",
                "status": "concluded",
                "total": 10000,
                "extra_costs": [{ "label": "frete", "amount": 5000 }]
            })),
            snapshot(json!({ "id": "b", "status": "concluded", "total": 30000 })),
        ];
        let ind = summarize(&snaps);

        assert_eq!(ind.total_billed.cents(), 40000);
        assert_eq!(ind.net_total.cents(), 35000);
        assert_eq!(ind.margin_percentage.bps(), 8750);
        assert_eq!(ind.average_ticket.cents(), 20000);
    }

    #[test]
    fn test_unmapped_orders_counted() {
        let snaps = vec![snapshot(json!({
            "id": "a",
            "total": 1000,
            "items": [{ "id": "i-1", "unit_price": 1000 }]
        }))];
        assert_eq!(summarize(&snaps).unmapped_orders, 1);
    }

    #[test]
    fn test_all_cancelled_has_zero_ticket() {
        let snaps = vec![snapshot(json!({ "id": "a", "status": "cancelled", "total": 500 }))];
        let ind = summarize(&snaps);
        assert!(ind.average_ticket.is_zero());
        assert!(ind.margin_percentage.is_zero());
        assert_eq!(ind.billable_count(), 0);
    }
}
