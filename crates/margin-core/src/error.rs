//! # Error Types
//!
//! Domain-specific error types for margin-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         What Can Go Wrong                               │
//! │                                                                         │
//! │  Configuration error  → ValidationError (rejected at write time)       │
//! │    margin thresholds out of order, rates outside 0-100%                │
//! │                                                                         │
//! │  Missing mapping      → NOT an error                                   │
//! │    no product / no tax category / no fee rule → zero + indicator       │
//! │                                                                         │
//! │  Malformed payload    → NOT an error                                   │
//! │    absent or odd-shaped provider fields → defaults                     │
//! │                                                                         │
//! │  The aggregator itself never returns an error.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core errors surfaced to callers that configure the engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Tenant margin settings were rejected.
    ///
    /// ## When This Occurs
    /// - A settings form posts `poor = 50, good_min = 30`
    /// - A stored settings row is loaded that predates validation
    #[error("Invalid margin settings: {0}")]
    InvalidMarginSettings(ValidationError),

    /// A payment fee rule was rejected.
    #[error("Invalid payment fee rule {rule_id}: {source}")]
    InvalidFeeRule {
        rule_id: String,
        #[source]
        source: ValidationError,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Two thresholds that must strictly increase do not.
    #[error("{lower} ({lower_value}) must be less than {upper} ({upper_value})")]
    NotIncreasing {
        lower: String,
        lower_value: i64,
        upper: String,
        upper_value: i64,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
