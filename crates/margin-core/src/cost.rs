//! # Cost Resolver
//!
//! Cost of goods (CMV) contributed by one order item.
//!
//! ```text
//! item: 2 × "Pizza Meia Calabresa"   mapping: Pizza Calabresa × 0.5
//!       + add-on 1 × "Borda Catupiry"   mapping: Catupiry × 1.0
//!
//! cost = 2 × 0.5 × R$30.00        (main portion)
//!      + 2 × 1 × 1.0 × R$4.00     (add-on portion)
//!      = R$38.00
//! ```
//!
//! Unmapped lines cost nothing and are flagged so the dashboard can ask the
//! user to map them. Nothing here fails.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{OrderItem, ProductMapping};

/// Cost contribution of one order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemCost {
    pub item_id: String,
    pub cost: Money,
    /// The main line has no internal product.
    pub unmapped: bool,
    /// Ids of add-ons with no internal product.
    pub unmapped_add_ons: Vec<String>,
}

/// Cost of `quantity` units through a mapping.
#[inline]
pub fn mapped_cost(mapping: &ProductMapping, quantity: i64) -> Money {
    mapping
        .product
        .unit_cost
        .multiply_portion(quantity, mapping.portion)
}

/// Resolves the cost of an item and its add-ons.
pub fn resolve_item_cost(item: &OrderItem) -> ItemCost {
    let qty = item.effective_quantity();

    let mut cost = item
        .mapping
        .as_ref()
        .map(|m| mapped_cost(m, qty))
        .unwrap_or_default();

    let mut unmapped_add_ons = Vec::new();
    for add_on in &item.add_ons {
        match &add_on.mapping {
            Some(mapping) => cost += mapped_cost(mapping, add_on.total_quantity(qty)),
            None => unmapped_add_ons.push(add_on.id.clone()),
        }
    }

    ItemCost {
        item_id: item.id.clone(),
        cost,
        unmapped: item.is_unmapped(),
        unmapped_add_ons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Portion;
    use crate::types::{AddOn, InternalProduct};

    fn product(cost: i64) -> InternalProduct {
        InternalProduct {
            id: format!("p-{cost}"),
            name: String::new(),
            unit_cost: Money::from_cents(cost),
            tax_category: None,
        }
    }

    fn item(qty: i64, mapping: Option<ProductMapping>) -> OrderItem {
        OrderItem {
            id: "i-1".into(),
            name: "Pizza".into(),
            quantity: qty,
            unit_price: Money::from_cents(5000),
            mapping,
            add_ons: Vec::new(),
        }
    }

    #[test]
    fn test_fully_mapped_item() {
        let mapping = ProductMapping { product: product(3000), portion: Portion::WHOLE };
        let cost = resolve_item_cost(&item(1, Some(mapping)));
        assert_eq!(cost.cost.cents(), 3000);
        assert!(!cost.unmapped);
    }

    #[test]
    fn test_fractional_portion_multiplies_quantity() {
        let mapping = ProductMapping { product: product(3000), portion: Portion::from_units(2500) };
        assert_eq!(resolve_item_cost(&item(3, Some(mapping))).cost.cents(), 2250);
    }

    #[test]
    fn test_unmapped_item_is_zero_and_flagged() {
        let cost = resolve_item_cost(&item(4, None));
        assert!(cost.cost.is_zero());
        assert!(cost.unmapped);
    }

    #[test]
    fn test_add_ons_are_costed_per_parent_unit() {
        let mut it = item(2, Some(ProductMapping { product: product(3000), portion: Portion::from_units(5000) }));
        it.add_ons.push(AddOn {
            id: "a-1".into(),
            name: "Borda".into(),
            quantity: 1,
            unit_price: Money::from_cents(800),
            mapping: Some(ProductMapping { product: product(400), portion: Portion::WHOLE }),
        });
        it.add_ons.push(AddOn {
            id: "a-2".into(),
            name: "Guardanapo".into(),
            quantity: 3,
            unit_price: Money::zero(),
            mapping: None,
        });

        let cost = resolve_item_cost(&it);
        assert_eq!(cost.cost.cents(), 3000 + 800);
        assert_eq!(cost.unmapped_add_ons, vec!["a-2".to_string()]);
    }
}
