//! Properties every financial snapshot must satisfy.

use margin_core::fees::resolve_fee;
use margin_core::{
    compute, compute_all, summarize, ComputeContext, FeeCategory, FeeType, MarginBand,
    MarginSettings, Money, Order, PaymentFeeRule, PaymentInfo, PaymentType, Provider,
};
use serde_json::{json, Value};

fn order(value: Value) -> Order {
    serde_json::from_value(value).unwrap()
}

fn mapped_item(id: &str, qty: i64, price: i64, cost: i64, tax_bps: i64) -> Value {
    json!({
        "id": id,
        "quantity": qty,
        "unit_price": price,
        "mapping": {
            "product": {
                "id": format!("p-{id}"),
                "unit_cost": cost,
                "tax_category": { "total_tax_rate": tax_bps }
            }
        }
    })
}

fn ifood_credit_rule(bps: i64) -> PaymentFeeRule {
    PaymentFeeRule {
        id: "ifood-credit".into(),
        provider: Some(Provider::Ifood),
        payment_type: PaymentType::Online,
        condition_values: vec!["credit".into()],
        fee_type: FeeType::Percentage,
        fee_value: bps,
        category: FeeCategory::Fee,
        active: true,
    }
}

/// A spread of orders covering mapped, unmapped, add-on, payload-only and cancelled cases.
fn fixture_orders() -> Vec<Order> {
    vec![
        order(json!({
            "id": "mapped",
            "status": "concluded",
            "total": 10000,
            "items": [mapped_item("a", 1, 10000, 3000, 1000)]
        })),
        order(json!({
            "id": "with-add-ons",
            "provider": "ifood",
            "status": "concluded",
            "payment": { "method": "CREDIT", "payment_type": "ONLINE" },
            "items": [{
                "id": "pizza",
                "quantity": 2,
                "unit_price": 4500,
                "mapping": { "product": { "unit_cost": 2000 }, "portion": 5000 },
                "add_ons": [
                    { "id": "borda", "quantity": 1, "unit_price": 800,
                      "mapping": { "product": { "unit_cost": 300,
                        "tax_category": { "total_tax_rate": 825 } } } },
                    { "id": "molho", "unit_price": 150 }
                ]
            }],
            "extra_costs": [{ "label": "embalagem", "amount": 120 }]
        })),
        order(json!({
            "id": "payload-only",
            "provider": "takeat",
            "payload": {
                "status": "finished",
                "total_price": "37.45",
                "payments": [{ "payment_method": { "keyword": "pix", "name": "Pix" } }]
            },
            "items": [mapped_item("x", 3, 1200, 700, 0)]
        })),
        order(json!({
            "id": "cancelled",
            "provider": "99food",
            "payload": { "order_info": { "status": "cancelled",
                "price": { "order_price": 5000, "unit": "cent" } } },
            "items": [mapped_item("y", 1, 5000, 1000, 500)]
        })),
        order(json!({ "id": "bare" })),
        order(json!({
            "id": "loss",
            "status": "concluded",
            "total": 2000,
            "items": [mapped_item("z", 1, 2000, 2500, 1000)]
        })),
    ]
}

#[test]
fn net_total_invariant_holds_for_every_order() {
    let settings = MarginSettings::default();
    let rules = vec![ifood_credit_rule(1200)];
    let ctx = ComputeContext::new(&settings, &rules);

    for snap in compute_all(&fixture_orders(), &ctx) {
        assert_eq!(
            snap.net_total,
            snap.order_total - snap.total_cost - snap.total_tax - snap.extra_cost - snap.total_commissions,
            "order {}",
            snap.order_id
        );
    }
}

#[test]
fn reference_order_is_good_at_sixty_percent() {
    let settings = MarginSettings::from_percentages(0.0, 30.0, 99.99, 100.0).unwrap();
    let snap = compute(&fixture_orders()[0], &ComputeContext::new(&settings, &[]));

    assert_eq!(snap.total_cost, Money::from_cents(3000));
    assert_eq!(snap.total_tax, Money::from_cents(1000));
    assert!(snap.total_commissions.is_zero());
    assert_eq!(snap.net_total, Money::from_cents(6000));
    assert_eq!(snap.margin_percentage.bps(), 6000);
    assert_eq!(snap.margin_band, MarginBand::Good);
}

#[test]
fn add_ons_are_costed_per_parent_unit() {
    let settings = MarginSettings::default();
    let rules = vec![ifood_credit_rule(1200)];
    let snap = compute(&fixture_orders()[1], &ComputeContext::new(&settings, &rules));

    // revenue: 2 × 45.00 + 2 × 8.00 + 2 × 1.50 = 109.00
    assert_eq!(snap.order_total, Money::from_cents(10900));
    // cost: 2 × 0.5 × 20.00 + 2 × 3.00 = 26.00
    assert_eq!(snap.total_cost, Money::from_cents(2600));
    // tax: 8.25% of 16.00 = 1.32
    assert_eq!(snap.total_tax, Money::from_cents(132));
    // fee: 12% of 109.00
    assert_eq!(snap.total_commissions, Money::from_cents(1308));
    assert_eq!(snap.payment.rule_id.as_deref(), Some("ifood-credit"));
    assert_eq!(snap.unmapped_add_ons, vec!["molho".to_string()]);
    assert!(snap.unmapped_items.is_empty());
}

#[test]
fn unmapped_items_cost_nothing_and_are_flagged() {
    let settings = MarginSettings::default();
    let o = order(json!({
        "id": "u",
        "total": 3000,
        "items": [
            { "id": "ghost", "quantity": 3, "unit_price": 1000 },
            mapped_item("real", 1, 0, 500, 0)
        ]
    }));
    let snap = compute(&o, &ComputeContext::new(&settings, &[]));

    assert_eq!(snap.unmapped_items, vec!["ghost".to_string()]);
    assert_eq!(snap.total_cost, Money::from_cents(500));
    assert!(snap.total_tax.is_zero());
    assert!(snap.has_unmapped());
}

#[test]
fn compute_is_idempotent() {
    let settings = MarginSettings::default();
    let rules = vec![ifood_credit_rule(1250)];
    let ctx = ComputeContext::new(&settings, &rules);
    let orders = fixture_orders();

    let first = compute_all(&orders, &ctx);
    let second = compute_all(&orders, &ctx);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn classification_is_monotonic_in_net_total() {
    fn rank(band: MarginBand) -> u8 {
        match band {
            MarginBand::Poor => 0,
            MarginBand::Neutral | MarginBand::Good => 1,
            MarginBand::Excellent => 2,
            MarginBand::NotApplicable => unreachable!(),
        }
    }

    let settings = MarginSettings::default();
    let ctx = ComputeContext::new(&settings, &[]);
    let mut last = 0;

    // Lower extra cost, higher net total, same order total.
    for extra in (0..=12000).rev().step_by(250) {
        let o = order(json!({
            "id": "m",
            "total": 10000,
            "extra_costs": [{ "label": "x", "amount": extra }]
        }));
        let snap = compute(&o, &ctx);
        if snap.margin_band == MarginBand::Neutral {
            continue;
        }
        let r = rank(snap.margin_band);
        assert!(r >= last, "band regressed at extra cost {extra}");
        last = r;
    }
    assert_eq!(last, 2);
}

#[test]
fn cancelled_orders_keep_numbers_but_leave_totals() {
    let settings = MarginSettings::default();
    let snaps = compute_all(&fixture_orders(), &ComputeContext::new(&settings, &[]));

    let cancelled = snaps.iter().find(|s| s.order_id == "cancelled").unwrap();
    assert!(cancelled.cancelled);
    assert_eq!(cancelled.margin_band, MarginBand::NotApplicable);
    assert_eq!(cancelled.order_total, Money::from_cents(5000));
    assert_eq!(cancelled.total_cost, Money::from_cents(1000));

    let ind = summarize(&snaps);
    let billed: Money = snaps
        .iter()
        .filter(|s| !s.cancelled)
        .map(|s| s.order_total)
        .sum();
    assert_eq!(ind.total_billed, billed);
    assert_eq!(ind.cancelled_count, 1);
}

#[test]
fn payload_fallbacks_fill_missing_fields() {
    let settings = MarginSettings::default();
    let snap = compute(&fixture_orders()[2], &ComputeContext::new(&settings, &[]));

    assert_eq!(snap.order_total, Money::from_cents(3745));
    assert_eq!(snap.payment.method.as_str(), "pix");
    assert!(!snap.cancelled);
}

#[test]
fn loss_making_order_is_poor() {
    let settings = MarginSettings::default();
    let snap = compute(&fixture_orders()[5], &ComputeContext::new(&settings, &[]));
    assert!(snap.net_total.is_negative());
    assert_eq!(snap.margin_band, MarginBand::Poor);
}

#[test]
fn subsidy_rules_tag_without_charging() {
    let rule = PaymentFeeRule {
        id: "voucher-subsidy".into(),
        provider: None,
        payment_type: PaymentType::Offline,
        condition_values: vec!["vale".into()],
        fee_type: FeeType::Fixed,
        fee_value: 300,
        category: FeeCategory::Subsidy,
        active: true,
    };
    let payment = PaymentInfo {
        method_name: Some("Vale Refeição".into()),
        ..Default::default()
    };
    let outcome = resolve_fee(&payment, Provider::Takeat, Money::from_cents(4000), &[rule]);
    assert_eq!(outcome.category, Some(FeeCategory::Subsidy));
    assert!(outcome.fee.is_zero());
}

#[test]
fn invalid_thresholds_are_rejected() {
    let err = MarginSettings::from_percentages(50.0, 30.0, 60.0, 80.0).unwrap_err();
    assert!(err.to_string().contains("margin_poor"));
}

#[test]
fn extreme_amounts_saturate_instead_of_overflowing() {
    let settings = MarginSettings::default();
    let ctx = ComputeContext::new(&settings, &[]);

    let huge_quantity = order(json!({
        "id": "huge-quantity",
        "status": "concluded",
        "items": [
            { "id": "a", "quantity": i64::MAX, "unit_price": 100 },
            { "id": "b", "quantity": 1, "unit_price": 100 }
        ]
    }));
    let snap = compute(&huge_quantity, &ctx);
    assert_eq!(snap.order_total, Money::from_cents(i64::MAX));
    assert_eq!(snap.net_total, snap.order_total);
    assert_eq!(snap.margin_band, MarginBand::Excellent);

    let huge_refund = order(json!({
        "id": "huge-refund",
        "status": "concluded",
        "total": -9_223_372_036_854_775_800_i64,
        "items": [{ "id": "c", "mapping": { "product": { "unit_cost": 1000 } } }]
    }));
    let snap = compute(&huge_refund, &ctx);
    assert_eq!(snap.net_total, Money::from_cents(i64::MIN));
    assert_eq!(snap.margin_band, MarginBand::Neutral);

    let indicators = summarize(&compute_all(&[huge_quantity, huge_refund], &ctx));
    assert_eq!(indicators.order_count, 2);
    assert_eq!(indicators.total_billed, Money::from_cents(7));
}
