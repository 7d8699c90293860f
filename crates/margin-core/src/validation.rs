//! # Validation Module
//!
//! Write-time validation of tenant configuration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Validation Happens                           │
//! │                                                                         │
//! │  Settings form / rule editor                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE: reject, never clamp                                      │
//! │  ├── margin thresholds strictly increasing, each in 0-100%             │
//! │  ├── tax and fee rates in 0-100%                                       │
//! │  └── costs and fixed fees not negative                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Aggregator: assumes validated config, tolerates messy orders          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use margin_core::money::Percentage;
//! use margin_core::validation::validate_margin_thresholds;
//!
//! let p = Percentage::from_percentage;
//! assert!(validate_margin_thresholds(p(0.0), p(30.0), p(99.99), p(100.0)).is_ok());
//! assert!(validate_margin_thresholds(p(50.0), p(30.0), p(60.0), p(80.0)).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Percentage, BPS_SCALE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a rate lies in [0%, 100%].
pub fn validate_rate(field: &str, rate: Percentage) -> ValidationResult<()> {
    if !(0..=BPS_SCALE).contains(&rate.bps()) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: BPS_SCALE,
        });
    }

    Ok(())
}

/// Validates that an amount is not negative.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates that an identifier is present.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Margin Thresholds
// =============================================================================

/// Validates the four margin thresholds.
///
/// ## Rules
/// - Each threshold lies in [0%, 100%]
/// - `poor < good_min < good_max < excellent`, strictly
///
/// ## Settings Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Settings: Margins                                                      │
/// │                                                                         │
/// │  poor=50  good_min=30  good_max=60  excellent=80                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_margin_thresholds ← THIS FUNCTION                            │
/// │       │                                                                 │
/// │       ├── poor ≥ good_min? → "margin_poor (5000) must be less than     │
/// │       │                       margin_good_min (3000)"                  │
/// │       │                                                                 │
/// │       └── OK → settings saved, recalculation may be triggered          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_margin_thresholds(
    poor: Percentage,
    good_min: Percentage,
    good_max: Percentage,
    excellent: Percentage,
) -> ValidationResult<()> {
    let named = [
        ("margin_poor", poor),
        ("margin_good_min", good_min),
        ("margin_good_max", good_max),
        ("margin_excellent", excellent),
    ];

    for (field, value) in named {
        validate_rate(field, value)?;
    }

    for pair in named.windows(2) {
        let (lower, lower_value) = pair[0];
        let (upper, upper_value) = pair[1];
        if lower_value >= upper_value {
            return Err(ValidationError::NotIncreasing {
                lower: lower.to_string(),
                lower_value: lower_value.bps(),
                upper: upper.to_string(),
                upper_value: upper_value.bps(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
