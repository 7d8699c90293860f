//! # Tax Resolver
//!
//! Tax contribution of one order item: the mapped product's tax category
//! rate applied to the item's revenue (price × quantity), never to its cost.
//! Add-ons mapped to taxed products are taxed on their own revenue.

use crate::money::Money;
use crate::types::{OrderItem, ProductMapping};

fn mapped_tax(mapping: Option<&ProductMapping>, revenue: Money) -> Money {
    match mapping {
        Some(m) if m.product.tax_category.is_some() => revenue.apply_percentage(m.product.tax_rate()),
        _ => Money::zero(),
    }
}

/// Resolves the tax of an item and its add-ons.
///
/// ## Example
/// ```rust
/// use margin_core::money::{Money, Percentage, Portion};
/// use margin_core::tax::resolve_item_tax;
/// use margin_core::types::{InternalProduct, OrderItem, ProductMapping, TaxCategory};
///
/// let product = InternalProduct {
///     id: "p".into(),
///     name: "Burger".into(),
///     unit_cost: Money::from_cents(3000),
///     tax_category: Some(TaxCategory {
///         id: "t".into(),
///         name: "Simples".into(),
///         total_tax_rate: Percentage::from_bps(1000),
///     }),
/// };
/// let item = OrderItem {
///     id: "i".into(),
///     name: "Burger".into(),
///     quantity: 1,
///     unit_price: Money::from_cents(10000),
///     mapping: Some(ProductMapping { product, portion: Portion::WHOLE }),
///     add_ons: vec![],
/// };
/// assert_eq!(resolve_item_tax(&item).cents(), 1000);
/// ```
pub fn resolve_item_tax(item: &OrderItem) -> Money {
    let qty = item.effective_quantity();
    let mut tax = mapped_tax(item.mapping.as_ref(), item.line_revenue());

    for add_on in &item.add_ons {
        tax += mapped_tax(add_on.mapping.as_ref(), add_on.revenue(qty));
    }

    tax
}
