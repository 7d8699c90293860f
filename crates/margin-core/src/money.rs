//! # Money Module
//!
//! Integer money, percentages and portions.
//!
//! ## Why Integers?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The dashboard used to sum float reais per table cell:                  │
//! │    45.9 + 0.1 + 0.2 = 46.199999999999996  ❌                             │
//! │                                                                         │
//! │  A recalculation job that re-runs the same order MUST produce the       │
//! │  same snapshot bit for bit. Floats make that fragile.                   │
//! │                                                                         │
//! │  OUR SOLUTION                                                           │
//! │    Money      → i64 cents                                               │
//! │    Percentage → basis points (1000 = 10.00%)                            │
//! │    Portion    → ten-thousandths (2500 = a quarter pizza)                │
//! │  Every product of these is rounded half-up to a cent exactly once.      │
//! │  Arithmetic saturates at the i64 bounds instead of wrapping.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use margin_core::money::{Money, Percentage, Portion};
//!
//! let price = Money::from_cents(4590); // R$45.90
//! let tax = price.apply_percentage(Percentage::from_bps(1000));
//! assert_eq!(tax.cents(), 459);
//!
//! let cost = Money::from_cents(3000).multiply_portion(2, Portion::from_units(2500));
//! assert_eq!(cost.cents(), 1500); // two quarter pizzas
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

/// Portion units in 1.0.
pub const PORTION_SCALE: i64 = 10_000;

/// Divides rounding half away from zero.
///
/// `d` must be positive.
#[inline]
fn round_div(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}

/// Saturates an i128 into the i64 range.
#[inline]
fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (centavos for BRL).
///
/// ## Design Decisions
/// - **i64 (signed)**: net totals and margins go negative on loss-making orders
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: `{"unit_cost": 3000}` is R$30.00
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  OrderItem.unit_price ──► revenue ──► Tax Resolver ──► total_tax        │
/// │  InternalProduct.unit_cost ──► Cost Resolver ──► total_cost            │
/// │  order_total ──► Fee Resolver ──► total_commissions                    │
/// │                                                                         │
/// │  net_total = order_total - cost - tax - extra - commissions            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -R$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal amount as providers send it (`"45.9"`, `"45,90"`, `"-3"`).
    ///
    /// Digits past the second decimal place are rounded half-up. Anything that
    /// is not a plain decimal (exponents, thousands separators, text) yields
    /// `None` so callers can fall back to zero.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("45.9"), Some(Money::from_cents(4590)));
    /// assert_eq!(Money::parse_decimal("12,345"), Some(Money::from_cents(1235)));
    /// assert_eq!(Money::parse_decimal("abc"), None);
    /// ```
    pub fn parse_decimal(text: &str) -> Option<Money> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (int_part, frac_part) = match digits.find(['.', ',']) {
            Some(pos) => (&digits[..pos], &digits[pos + 1..]),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let major: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };

        let frac = frac_part.as_bytes();
        let digit = |i: usize| frac.get(i).map(|b| (b - b'0') as i64).unwrap_or(0);
        let mut cents = major.checked_mul(100)?.checked_add(digit(0) * 10 + digit(1))?;
        if digit(2) >= 5 {
            cents = cents.checked_add(1)?;
        }

        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (reais) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (centavos) portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies money by a quantity and a fractional portion, rounding once.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::money::{Money, Portion};
    ///
    /// // 3 slices mapped at 1/8 of a R$40.00 pizza each
    /// let cost = Money::from_cents(4000).multiply_portion(3, Portion::from_units(1250));
    /// assert_eq!(cost.cents(), 1500);
    /// ```
    pub fn multiply_portion(&self, qty: i64, portion: Portion) -> Self {
        let n = self.0 as i128 * qty as i128 * portion.units() as i128;
        Money(clamp_i64(round_div(n, PORTION_SCALE as i128)))
    }

    /// Applies a percentage to this amount, rounding half-up to a cent.
    ///
    /// Used for tax on revenue and percentage payment fees.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::money::{Money, Percentage};
    ///
    /// let total = Money::from_cents(1000);
    /// // R$10.00 × 8.25% = R$0.825 → R$0.83
    /// assert_eq!(total.apply_percentage(Percentage::from_bps(825)).cents(), 83);
    /// ```
    pub fn apply_percentage(&self, rate: Percentage) -> Money {
        let n = self.0 as i128 * rate.bps() as i128;
        Money(clamp_i64(round_div(n, BPS_SCALE as i128)))
    }

    /// Splits this amount evenly, rounding half-up; zero for a non-positive count.
    pub fn average_over(&self, count: i64) -> Money {
        if count <= 0 {
            return Money::zero();
        }
        Money(clamp_i64(round_div(self.0 as i128, count as i128)))
    }
}

impl fmt::Display for Money {
    /// Debug-friendly rendering; the dashboard does its own locale formatting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in basis points: 1 bp = 0.01%, 10000 = 100%.
///
/// Signed because margins go negative. Tax rates, fee rates and margin
/// thresholds are validated to [0, 10000] where they are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(i64);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a human value (`8.25` → 825 bps).
    ///
    /// Only for configuration input; arithmetic never goes through floats.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() {
            return Percentage(0);
        }
        Percentage((pct * 100.0).round() as i64)
    }

    /// Computes `part / whole` as a percentage, half-up; zero if `whole <= 0`.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::money::{Money, Percentage};
    ///
    /// let margin = Percentage::ratio(Money::from_cents(6000), Money::from_cents(10000));
    /// assert_eq!(margin.bps(), 6000);
    /// ```
    pub fn ratio(part: Money, whole: Money) -> Self {
        if whole.cents() <= 0 {
            return Percentage(0);
        }
        let n = part.cents() as i128 * BPS_SCALE as i128;
        Percentage(clamp_i64(round_div(n, whole.cents() as i128)))
    }

    /// Returns the value in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the value as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}%", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

// =============================================================================
// Portion
// =============================================================================

/// Fractional quantity multiplier of a mapping, in ten-thousandths.
///
/// A pizza sold by the slice maps each slice to 1/8 of the whole product
/// (`Portion::from_units(1250)`); a combo item maps at 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Portion(u32);

impl Portion {
    /// A whole unit (1.0).
    pub const WHOLE: Portion = Portion(PORTION_SCALE as u32);

    /// Creates a portion from ten-thousandths.
    #[inline]
    pub const fn from_units(units: u32) -> Self {
        Portion(units)
    }

    /// Creates a portion from a decimal multiplier (`0.25` → 2500 units).
    ///
    /// Negative or non-finite input collapses to zero.
    pub fn from_decimal(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Portion(0);
        }
        Portion((value * PORTION_SCALE as f64).round().min(u32::MAX as f64) as u32)
    }

    /// Returns the portion in ten-thousandths.
    #[inline]
    pub const fn units(&self) -> u32 {
        self.0
    }

    /// Checks if this portion is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Portion {
    fn default() -> Self {
        Portion::WHOLE
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
