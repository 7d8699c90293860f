//! # Margin Classifier
//!
//! Turns a net margin into the band the dashboard colors the order with.
//!
//! ## Bands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   cancelled? ──yes──► NotApplicable (checked first)                     │
//! │       │                                                                 │
//! │       no                                                                │
//! │       ▼                                                                 │
//! │   margin == 0 ──yes──► Neutral (independent of thresholds)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   ──────┬──────────────────────────────┬──────────────────►  margin %   │
//! │       poor                         excellent                            │
//! │   Poor  │            Good              │  Excellent                     │
//! │   (≤)   │                              │  (≥)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `margin_good_min` and `margin_good_max` are part of the tenant's settings
//! and participate in validation; classification only needs the outer two.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Percentage};
use crate::validation::{validate_margin_thresholds, ValidationResult};

// =============================================================================
// Margin Settings
// =============================================================================

/// Raw threshold values as submitted or stored, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginThresholds {
    pub margin_poor: Percentage,
    pub margin_good_min: Percentage,
    pub margin_good_max: Percentage,
    pub margin_excellent: Percentage,
}

/// Per-tenant margin thresholds, guaranteed valid.
///
/// The only ways to obtain one ([`MarginSettings::new`], deserialization,
/// [`Default`]) all enforce `poor < good_min < good_max < excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "MarginThresholds")]
pub struct MarginSettings {
    margin_poor: Percentage,
    margin_good_min: Percentage,
    margin_good_max: Percentage,
    margin_excellent: Percentage,
}

impl MarginSettings {
    /// Validates and builds settings. Rejects, never clamps.
    ///
    /// ## Example
    /// ```rust
    /// use margin_core::margin::MarginSettings;
    /// use margin_core::money::Percentage;
    ///
    /// let p = Percentage::from_percentage;
    /// assert!(MarginSettings::new(p(50.0), p(30.0), p(60.0), p(80.0)).is_err());
    /// ```
    pub fn new(
        margin_poor: Percentage,
        margin_good_min: Percentage,
        margin_good_max: Percentage,
        margin_excellent: Percentage,
    ) -> ValidationResult<Self> {
        validate_margin_thresholds(margin_poor, margin_good_min, margin_good_max, margin_excellent)?;

        Ok(MarginSettings {
            margin_poor,
            margin_good_min,
            margin_good_max,
            margin_excellent,
        })
    }

    /// Builds settings from human percentages (`99.99`).
    pub fn from_percentages(
        poor: f64,
        good_min: f64,
        good_max: f64,
        excellent: f64,
    ) -> ValidationResult<Self> {
        Self::new(
            Percentage::from_percentage(poor),
            Percentage::from_percentage(good_min),
            Percentage::from_percentage(good_max),
            Percentage::from_percentage(excellent),
        )
    }

    pub fn margin_poor(&self) -> Percentage {
        self.margin_poor
    }

    pub fn margin_good_min(&self) -> Percentage {
        self.margin_good_min
    }

    pub fn margin_good_max(&self) -> Percentage {
        self.margin_good_max
    }

    pub fn margin_excellent(&self) -> Percentage {
        self.margin_excellent
    }

    /// The raw thresholds, e.g. to pre-fill a settings form.
    pub fn thresholds(&self) -> MarginThresholds {
        MarginThresholds {
            margin_poor: self.margin_poor,
            margin_good_min: self.margin_good_min,
            margin_good_max: self.margin_good_max,
            margin_excellent: self.margin_excellent,
        }
    }
}

impl TryFrom<MarginThresholds> for MarginSettings {
    type Error = ValidationError;

    fn try_from(t: MarginThresholds) -> Result<Self, Self::Error> {
        MarginSettings::new(
            t.margin_poor,
            t.margin_good_min,
            t.margin_good_max,
            t.margin_excellent,
        )
    }
}

impl Default for MarginSettings {
    /// 10% / 15% / 29.99% / 30%.
    fn default() -> Self {
        MarginSettings {
            margin_poor: Percentage::from_bps(1000),
            margin_good_min: Percentage::from_bps(1500),
            margin_good_max: Percentage::from_bps(2999),
            margin_excellent: Percentage::from_bps(3000),
        }
    }
}

// =============================================================================
// Margin Band
// =============================================================================

/// Qualitative classification of an order's net margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MarginBand {
    Excellent,
    Good,
    Poor,
    /// Margin of exactly zero.
    Neutral,
    /// Cancelled order; numbers are display-only.
    NotApplicable,
}

impl MarginBand {
    /// Badge variant the dashboard renders for this band.
    pub fn badge_variant(&self) -> &'static str {
        match self {
            MarginBand::Excellent => "default",
            MarginBand::Good => "warning",
            MarginBand::Poor => "destructive",
            MarginBand::Neutral => "secondary",
            MarginBand::NotApplicable => "outline",
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Net margin as a percentage of the order total; zero when the total is not positive.
#[inline]
pub fn margin_percentage(net_total: Money, order_total: Money) -> Percentage {
    Percentage::ratio(net_total, order_total)
}

/// Classifies a margin against tenant thresholds.
///
/// ## Example
/// ```rust
/// use margin_core::margin::{classify, MarginBand, MarginSettings};
/// use margin_core::money::Percentage;
///
/// let settings = MarginSettings::from_percentages(0.0, 30.0, 99.99, 100.0).unwrap();
/// let band = classify(Percentage::from_bps(6000), &settings, false);
/// assert_eq!(band, MarginBand::Good);
/// ```
pub fn classify(margin: Percentage, settings: &MarginSettings, cancelled: bool) -> MarginBand {
    if cancelled {
        return MarginBand::NotApplicable;
    }
    if margin.is_zero() {
        return MarginBand::Neutral;
    }
    if margin <= settings.margin_poor {
        MarginBand::Poor
    } else if margin >= settings.margin_excellent {
        MarginBand::Excellent
    } else {
        MarginBand::Good
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
