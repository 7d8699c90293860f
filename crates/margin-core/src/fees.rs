//! # Fee/Commission Resolver
//!
//! Picks the tenant's payment fee rule for an order and computes the fee.
//!
//! ## Rule Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order: provider=ifood, "Cartão de Crédito", type=ONLINE, total=R$100   │
//! │     │                                                                   │
//! │     ▼  payment::classify → credit / online                             │
//! │                                                                         │
//! │  Candidates (active, same payment type):                               │
//! │  ┌──────────┬──────────┬─────────────┬───────────────┬───────┐          │
//! │  │ rule     │ provider │ conditions  │ specificity   │ fee   │          │
//! │  ├──────────┼──────────┼─────────────┼───────────────┼───────┤          │
//! │  │ global   │ (all)    │ (any)       │ 0 + 0 = 0     │ 2%    │          │
//! │  │ ifood    │ ifood    │ (any)       │ 2 + 0 = 2     │ 3.2%  │          │
//! │  │ ifood-cc │ ifood    │ credit      │ 2 + 1 = 3  ◄──│ 3.5%  │          │
//! │  └──────────┴──────────┴─────────────┴───────────────┴───────┘          │
//! │                                                                         │
//! │  Offline rules never match without an explicit method condition.       │
//! │  Ties go to the rule listed first.                                     │
//! │  No candidate → fee R$0.00, tagged "no rule" (fail open).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percentage};
use crate::payment::{classify, classify_payment_type, CanonicalMethod, PaymentType};
use crate::types::{PaymentInfo, Provider};
use crate::validation::{validate_non_negative, validate_rate, validate_required};

/// Specificity awarded for an exact provider match.
const PROVIDER_MATCH_SCORE: u8 = 2;

/// Specificity awarded for an explicit method condition match.
const METHOD_MATCH_SCORE: u8 = 1;

// =============================================================================
// Rule Types
// =============================================================================

/// How `fee_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    /// `fee_value` is basis points of the order total.
    Percentage,
    /// `fee_value` is cents.
    Fixed,
}

/// What a matched rule means for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FeeCategory {
    /// A charged fee or commission.
    #[default]
    Fee,
    /// Platform-funded payment (adds to what the store receives).
    Subsidy,
    /// Store-funded discount paid through the platform.
    Discount,
    /// Categorized but uncharged.
    NoFee,
}

impl FeeCategory {
    /// Only plain fees produce an amount.
    #[inline]
    pub fn is_charged(&self) -> bool {
        matches!(self, FeeCategory::Fee)
    }
}

fn default_true() -> bool {
    true
}

/// A tenant-configured payment fee rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentFeeRule {
    pub id: String,

    /// `None` applies to every provider.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub provider: Option<Provider>,

    pub payment_type: PaymentType,

    /// Method codes this rule is limited to; empty is a wildcard for online rules.
    #[serde(default)]
    pub condition_values: Vec<String>,

    pub fee_type: FeeType,

    /// Basis points for percentage rules, cents for fixed rules.
    #[serde(default)]
    pub fee_value: i64,

    #[serde(default)]
    pub category: FeeCategory,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl PaymentFeeRule {
    /// Validates the rule before it is stored.
    pub fn validate(&self) -> CoreResult<()> {
        let wrap = |source| CoreError::InvalidFeeRule {
            rule_id: self.id.clone(),
            source,
        };

        validate_required("id", &self.id).map_err(wrap)?;
        match self.fee_type {
            FeeType::Percentage => {
                validate_rate("fee_value", Percentage::from_bps(self.fee_value)).map_err(wrap)?
            }
            FeeType::Fixed => {
                validate_non_negative("fee_value", Money::from_cents(self.fee_value)).map_err(wrap)?
            }
        }

        Ok(())
    }

    /// Condition values normalized to canonical methods.
    pub fn condition_methods(&self) -> impl Iterator<Item = CanonicalMethod> + '_ {
        self.condition_values
            .iter()
            .map(|value| classify(None, Some(value)))
    }

    /// Specificity of this rule for the given order, `None` if it does not apply.
    pub fn specificity(
        &self,
        provider: Provider,
        method: CanonicalMethod,
        payment_type: PaymentType,
    ) -> Option<u8> {
        if !self.active || self.payment_type != payment_type {
            return None;
        }

        let provider_score = match self.provider {
            Some(p) if p == provider => PROVIDER_MATCH_SCORE,
            Some(_) => return None,
            None => 0,
        };

        let method_score = if self.condition_values.is_empty() {
            match payment_type {
                PaymentType::Online => 0,
                PaymentType::Offline => return None,
            }
        } else if self.condition_methods().any(|m| m == method) {
            METHOD_MATCH_SCORE
        } else {
            return None;
        };

        Some(provider_score + method_score)
    }

    /// Fee this rule charges on an order total.
    pub fn fee_for(&self, order_total: Money) -> Money {
        if !self.category.is_charged() {
            return Money::zero();
        }
        match self.fee_type {
            FeeType::Percentage if order_total.is_positive() => {
                order_total.apply_percentage(Percentage::from_bps(self.fee_value))
            }
            FeeType::Percentage => Money::zero(),
            FeeType::Fixed => Money::from_cents(self.fee_value),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Result of resolving an order's payment fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeOutcome {
    pub method: CanonicalMethod,
    pub payment_type: PaymentType,
    /// Matched rule; `None` means no rule applied ("no fee" indicator).
    pub rule_id: Option<String>,
    pub category: Option<FeeCategory>,
    pub fee: Money,
}

impl FeeOutcome {
    /// Checks if no rule matched.
    #[inline]
    pub fn is_unmatched(&self) -> bool {
        self.rule_id.is_none()
    }
}

/// Selects the most specific matching rule; ties go to the earliest rule.
pub fn select_rule<'a>(
    rules: &'a [PaymentFeeRule],
    provider: Provider,
    method: CanonicalMethod,
    payment_type: PaymentType,
) -> Option<&'a PaymentFeeRule> {
    let mut best: Option<(u8, &PaymentFeeRule)> = None;
    for rule in rules {
        if let Some(score) = rule.specificity(provider, method, payment_type) {
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, rule));
            }
        }
    }
    best.map(|(_, rule)| rule)
}

/// Resolves the payment fee for one order.
///
/// ## Example
/// ```rust
/// use margin_core::fees::resolve_fee;
/// use margin_core::money::Money;
/// use margin_core::types::{PaymentInfo, Provider};
///
/// let payment = PaymentInfo { method_name: Some("Pix".into()), ..Default::default() };
/// let outcome = resolve_fee(&payment, Provider::Takeat, Money::from_cents(5000), &[]);
/// assert!(outcome.is_unmatched());
/// assert!(outcome.fee.is_zero());
/// ```
pub fn resolve_fee(
    payment: &PaymentInfo,
    provider: Provider,
    order_total: Money,
    rules: &[PaymentFeeRule],
) -> FeeOutcome {
    let method = classify(payment.method_name.as_deref(), payment.method.as_deref());
    let payment_type = classify_payment_type(
        payment.payment_type.as_deref(),
        payment.method_name.as_deref(),
    );

    match select_rule(rules, provider, method, payment_type) {
        Some(rule) => FeeOutcome {
            method,
            payment_type,
            rule_id: Some(rule.id.clone()),
            category: Some(rule.category),
            fee: rule.fee_for(order_total),
        },
        None => FeeOutcome {
            method,
            payment_type,
            rule_id: None,
            category: None,
            fee: Money::zero(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
