//! # Domain Types
//!
//! Orders as the engine receives them: already ingested from a provider,
//! with item mappings and tax categories joined in.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │ ProductMapping  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  provider       │──►│  quantity       │──►│  product        │       │
//! │  │  status         │   │  unit_price     │   │  portion (0.25) │       │
//! │  │  payload (raw)  │   │  mapping?       │   └────────┬────────┘       │
//! │  │  extra_costs    │   │  add_ons[]      │            │                │
//! │  └─────────────────┘   └─────────────────┘            ▼                │
//! │                                              ┌─────────────────┐       │
//! │                                              │ InternalProduct │       │
//! │                                              │  unit_cost      │       │
//! │                                              │  tax_category?  │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every optional field deserializes to a default so that historical orders
//! with incomplete provider data still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Percentage, Portion};
use crate::validation::{validate_non_negative, validate_rate, ValidationResult};

// =============================================================================
// Provider
// =============================================================================

/// Delivery platform an order was ingested from.
///
/// Deserializes from any string; unknown platforms become `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    Ifood,
    Takeat,
    NinetyNineFood,
    #[default]
    Other,
}

impl Provider {
    /// Canonical lowercase code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ifood => "ifood",
            Provider::Takeat => "takeat",
            Provider::NinetyNineFood => "99food",
            Provider::Other => "other",
        }
    }

    /// Parses a provider name leniently (`"iFood"`, `"99Food"`, `"food99"`).
    pub fn parse(name: &str) -> Self {
        let name: String = name
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match name.as_str() {
            "ifood" => Provider::Ifood,
            "takeat" => Provider::Takeat,
            "99food" | "food99" | "99" | "ninetyninefood" => Provider::NinetyNineFood,
            _ => Provider::Other,
        }
    }
}

impl From<String> for Provider {
    fn from(value: String) -> Self {
        Provider::parse(&value)
    }
}

impl From<Provider> for String {
    fn from(value: Provider) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Canonical order status; provider codes are normalized into this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Dispatched,
    Concluded,
    Cancelled,
    /// Status code missing or not recognized.
    #[default]
    Unknown,
}

impl OrderStatus {
    /// Cancelled orders are display-only.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

// =============================================================================
// Products & Tax
// =============================================================================

/// A named total tax rate shared by several products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxCategory {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Total tax rate in basis points (1000 = 10%).
    #[serde(default)]
    pub total_tax_rate: Percentage,
}

impl TaxCategory {
    /// Rejects a total rate outside 0-100%.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_rate("total_tax_rate", self.total_tax_rate)
    }
}

/// A tenant-owned product with a known unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InternalProduct {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Cost of one whole unit, in cents.
    #[serde(default)]
    pub unit_cost: Money,
    #[serde(default)]
    pub tax_category: Option<TaxCategory>,
}

impl InternalProduct {
    /// Checks the product as a product editor would before saving it.
    ///
    /// The aggregator never calls this; it computes with whatever it is given.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_non_negative("unit_cost", self.unit_cost)?;
        if let Some(category) = &self.tax_category {
            category.validate()?;
        }
        Ok(())
    }

    /// The tax rate of this product, zero when it has no category.
    pub fn tax_rate(&self) -> Percentage {
        self.tax_category
            .as_ref()
            .map(|c| c.total_tax_rate)
            .unwrap_or_default()
    }
}

/// Link from a provider line item to an internal product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductMapping {
    pub product: InternalProduct,
    /// Fraction of the product one unit of the line item consumes.
    #[serde(default)]
    pub portion: Portion,
}

// =============================================================================
// Order Items
// =============================================================================

fn default_quantity() -> i64 {
    1
}

/// An option/complement attached to an order item ("extra cheese").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddOn {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Quantity per unit of the parent item.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub mapping: Option<ProductMapping>,
}

impl AddOn {
    /// Units of this add-on sold across `parent_quantity` parent units.
    #[inline]
    pub fn total_quantity(&self, parent_quantity: i64) -> i64 {
        parent_quantity.max(0).saturating_mul(self.quantity.max(0))
    }

    /// Revenue of this add-on across the parent quantity.
    pub fn revenue(&self, parent_quantity: i64) -> Money {
        self.unit_price
            .multiply_quantity(self.total_quantity(parent_quantity))
    }
}

/// A line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Money,
    /// The "main" mapping; `None` means the item is unmapped.
    #[serde(default)]
    pub mapping: Option<ProductMapping>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
}

impl OrderItem {
    /// Quantity clamped at zero; negative quantities contribute nothing.
    #[inline]
    pub fn effective_quantity(&self) -> i64 {
        self.quantity.max(0)
    }

    /// Revenue of the main line (unit price × quantity), add-ons excluded.
    pub fn line_revenue(&self) -> Money {
        self.unit_price.multiply_quantity(self.effective_quantity())
    }

    /// Revenue of the line plus all add-ons.
    pub fn total_revenue(&self) -> Money {
        let qty = self.effective_quantity();
        self.line_revenue() + self.add_ons.iter().map(|a| a.revenue(qty)).sum::<Money>()
    }

    /// Checks if the main line has no internal product.
    #[inline]
    pub fn is_unmapped(&self) -> bool {
        self.mapping.is_none()
    }
}

// =============================================================================
// Extra Costs
// =============================================================================

/// A cost borne by the store that is not tied to an item
/// (packaging, merchant-paid delivery, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtraCost {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub amount: Money,
}

// =============================================================================
// Payment Info
// =============================================================================

/// Payment fields as the ingestion layer stored them.
///
/// All free text; classification happens in [`crate::payment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInfo {
    /// Provider method code (`"CREDIT"`, `"PIX"`).
    #[serde(default)]
    pub method: Option<String>,
    /// Display name (`"Cartão de Crédito - Visa"`).
    #[serde(default)]
    pub method_name: Option<String>,
    /// Provider payment type (`"ONLINE"`, `"OFFLINE"`).
    #[serde(default)]
    pub payment_type: Option<String>,
}

impl PaymentInfo {
    /// Checks if no payment field is populated.
    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.method_name.is_none() && self.payment_type.is_none()
    }
}

// =============================================================================
// Order
// =============================================================================

/// An ingested marketplace order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,

    #[serde(default)]
    pub tenant_id: String,

    #[serde(default)]
    #[ts(as = "String")]
    pub provider: Provider,

    /// Canonical status; `Unknown` falls back to the payload's status code.
    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub placed_at: Option<DateTime<Utc>>,

    /// Order total as stored; falls back to the payload, then to item revenue.
    #[serde(default)]
    pub total: Option<Money>,

    /// Payment fields as stored; falls back to the payload.
    #[serde(default)]
    pub payment: Option<PaymentInfo>,

    /// Raw provider payload (opaque, provider-specific).
    #[serde(default)]
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,

    #[serde(default)]
    pub items: Vec<OrderItem>,

    #[serde(default)]
    pub extra_costs: Vec<ExtraCost>,

    /// Linked sale record, if the order was converted into one.
    #[serde(default)]
    pub sale_id: Option<String>,
}

impl Order {
    /// Sum of item revenue including add-ons.
    pub fn items_revenue(&self) -> Money {
        self.items.iter().map(OrderItem::total_revenue).sum()
    }

    /// Sum of extra costs.
    pub fn extra_cost(&self) -> Money {
        self.extra_costs.iter().map(|c| c.amount).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("iFood"), Provider::Ifood);
        assert_eq!(Provider::parse("TAKEAT"), Provider::Takeat);
        assert_eq!(Provider::parse("99Food"), Provider::NinetyNineFood);
        assert_eq!(Provider::parse("99 food"), Provider::NinetyNineFood);
        assert_eq!(Provider::parse("rappi"), Provider::Other);
    }

    #[test]
    fn test_provider_serde_roundtrip() {
        let p: Provider = serde_json::from_value(json!("99food")).unwrap();
        assert_eq!(p, Provider::NinetyNineFood);
        assert_eq!(serde_json::to_value(p).unwrap(), json!("99food"));
    }

    #[test]
    fn test_order_deserializes_with_missing_fields() {
        let order: Order = serde_json::from_value(json!({ "id": "o-1" })).unwrap();
        assert_eq!(order.provider, Provider::Other);
        assert_eq!(order.status, OrderStatus::Unknown);
        assert!(order.items.is_empty());
        assert!(order.payload.is_null());
    }

    #[test]
    fn test_item_revenue_with_add_ons() {
        let item: OrderItem = serde_json::from_value(json!({
            "quantity": 2,
            "unit_price": 3000,
            "add_ons": [{ "quantity": 1, "unit_price": 500 }]
        }))
        .unwrap();
        assert_eq!(item.line_revenue().cents(), 6000);
        assert_eq!(item.total_revenue().cents(), 7000);
        assert!(item.is_unmapped());
    }

    #[test]
    fn test_negative_quantity_contributes_nothing() {
        let item: OrderItem =
            serde_json::from_value(json!({ "quantity": -3, "unit_price": 1000 })).unwrap();
        assert_eq!(item.line_revenue(), Money::zero());
    }

    #[test]
    fn test_product_validation() {
        let product: InternalProduct = serde_json::from_value(json!({
            "id": "p",
            "unit_cost": 1200,
            "tax_category": { "total_tax_rate": 1800 }
        }))
        .unwrap();
        assert!(product.validate().is_ok());

        let negative = InternalProduct {
            unit_cost: Money::from_cents(-1),
            ..product.clone()
        };
        assert_eq!(
            negative.validate(),
            Err(ValidationError::MustNotBeNegative {
                field: "unit_cost".to_string()
            })
        );

        let mut overtaxed = product;
        overtaxed.tax_category = Some(TaxCategory {
            id: "t".into(),
            name: "broken".into(),
            total_tax_rate: Percentage::from_bps(10_001),
        });
        assert!(matches!(
            overtaxed.validate(),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "total_tax_rate"
        ));
    }

    #[test]
    fn test_product_tax_rate_defaults_to_zero() {
        let product: InternalProduct =
            serde_json::from_value(json!({ "id": "p", "unit_cost": 100 })).unwrap();
        assert!(product.tax_rate().is_zero());
    }
}
