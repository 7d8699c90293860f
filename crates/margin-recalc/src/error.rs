//! # Recalculation Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Storage     │  │         Job             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  SourceFailed   │  │  Cancelled              │ │
//! │  │  ConfigLoad...  │  │  SinkFailed     │  │  WorkerFailed           │ │
//! │  │  InvalidSettings│  │                 │  │  JobNotFound            │ │
//! │  │                 │  │                 │  │  JobFailed              │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use margin_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for recalculation operations.
pub type RecalcResult<T> = Result<T, RecalcError>;

#[derive(Debug, Error)]
pub enum RecalcError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid recalc configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// Tenant settings or fee rules failed validation.
    #[error("Invalid tenant settings: {0}")]
    InvalidSettings(#[from] CoreError),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Failed to load orders: {0}")]
    SourceFailed(String),

    #[error("Failed to store snapshots: {0}")]
    SinkFailed(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("cancelled")]
    Cancelled,

    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    /// A finished job reported an error other than cancellation.
    #[error("Recalculation job {key} failed: {message}")]
    JobFailed { key: String, message: String },

    #[error("Recalculation job not found: {0}")]
    JobNotFound(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for RecalcError {
    fn from(err: ValidationError) -> Self {
        RecalcError::InvalidSettings(CoreError::InvalidMarginSettings(err))
    }
}

impl From<serde_json::Error> for RecalcError {
    fn from(err: serde_json::Error) -> Self {
        RecalcError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for RecalcError {
    fn from(err: std::io::Error) -> Self {
        RecalcError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for RecalcError {
    fn from(err: toml::de::Error) -> Self {
        RecalcError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for RecalcError {
    fn from(err: toml::ser::Error) -> Self {
        RecalcError::ConfigSaveFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for RecalcError {
    fn from(err: tokio::task::JoinError) -> Self {
        RecalcError::WorkerFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl RecalcError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RecalcError::InvalidConfig(_)
                | RecalcError::ConfigLoadFailed(_)
                | RecalcError::ConfigSaveFailed(_)
                | RecalcError::InvalidSettings(_)
        )
    }

    /// Returns true if the job was stopped on request rather than by a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RecalcError::Cancelled)
    }
}
