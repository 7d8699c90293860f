//! # Recalculation Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MARGIN_RECALC_WORKERS=8                                            │
//! │     MARGIN_DEFAULT_MARGIN_POOR=12.5                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/orders/recalc.toml (Linux)                               │
//! │     ~/Library/Application Support/com.margin.orders/recalc.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     batch 200, 4 workers, margins 10 / 15 / 29.99 / 30 %               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # recalc.toml
//! [job]
//! batch_size = 200
//! workers = 4
//! progress_ttl_secs = 3600
//!
//! [default_margins]   # percentages, used for tenants with no settings row
//! margin_poor = 10.0
//! margin_good_min = 15.0
//! margin_good_max = 29.99
//! margin_excellent = 30.0
//! ```

use margin_core::MarginSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{RecalcError, RecalcResult};

/// Upper bound on concurrent workers per job.
pub const MAX_WORKERS: usize = 64;

// =============================================================================
// Job Settings
// =============================================================================

/// Batch and concurrency settings of a recalculation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Orders per batch; progress is published after each batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent blocking tasks per batch.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How long finished progress records stay pollable.
    #[serde(default = "default_progress_ttl")]
    pub progress_ttl_secs: u64,
}

fn default_batch_size() -> usize {
    200
}
fn default_workers() -> usize {
    4
}
fn default_progress_ttl() -> u64 {
    3600
}

impl Default for JobSettings {
    fn default() -> Self {
        JobSettings {
            batch_size: default_batch_size(),
            workers: default_workers(),
            progress_ttl_secs: default_progress_ttl(),
        }
    }
}

// =============================================================================
// Default Margins
// =============================================================================

/// Margin thresholds in percent, applied when a tenant has none stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultMargins {
    #[serde(default = "default_poor")]
    pub margin_poor: f64,
    #[serde(default = "default_good_min")]
    pub margin_good_min: f64,
    #[serde(default = "default_good_max")]
    pub margin_good_max: f64,
    #[serde(default = "default_excellent")]
    pub margin_excellent: f64,
}

fn default_poor() -> f64 {
    10.0
}
fn default_good_min() -> f64 {
    15.0
}
fn default_good_max() -> f64 {
    29.99
}
fn default_excellent() -> f64 {
    30.0
}

impl Default for DefaultMargins {
    fn default() -> Self {
        DefaultMargins {
            margin_poor: default_poor(),
            margin_good_min: default_good_min(),
            margin_good_max: default_good_max(),
            margin_excellent: default_excellent(),
        }
    }
}

impl DefaultMargins {
    /// Validated settings built from these percentages.
    pub fn to_settings(&self) -> RecalcResult<MarginSettings> {
        Ok(MarginSettings::from_percentages(
            self.margin_poor,
            self.margin_good_min,
            self.margin_good_max,
            self.margin_excellent,
        )?)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete recalculation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalcConfig {
    #[serde(default)]
    pub job: JobSettings,

    #[serde(default)]
    pub default_margins: DefaultMargins,
}

impl RecalcConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (recalc.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RecalcResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading recalc config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load recalc config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> RecalcResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RecalcError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Recalc config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RecalcResult<()> {
        if self.job.batch_size == 0 {
            return Err(RecalcError::InvalidConfig(
                "batch_size must be greater than 0".into(),
            ));
        }

        if self.job.workers == 0 || self.job.workers > MAX_WORKERS {
            return Err(RecalcError::InvalidConfig(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.job.workers
            )));
        }

        self.default_margins.to_settings()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup; unparsable values are skipped.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(value) => {
                    debug!(key, value = %raw, "Overriding recalc config from environment");
                    Some(value)
                }
                Err(_) => {
                    warn!(key, value = %raw, "Ignoring unparsable environment override");
                    None
                }
            }
        }

        if let Some(v) = parsed("MARGIN_RECALC_BATCH_SIZE", var("MARGIN_RECALC_BATCH_SIZE")) {
            self.job.batch_size = v;
        }
        if let Some(v) = parsed("MARGIN_RECALC_WORKERS", var("MARGIN_RECALC_WORKERS")) {
            self.job.workers = v;
        }
        if let Some(v) = parsed(
            "MARGIN_RECALC_PROGRESS_TTL_SECS",
            var("MARGIN_RECALC_PROGRESS_TTL_SECS"),
        ) {
            self.job.progress_ttl_secs = v;
        }

        // Default margins (percent)
        let margins = &mut self.default_margins;
        for (key, slot) in [
            ("MARGIN_DEFAULT_MARGIN_POOR", &mut margins.margin_poor),
            ("MARGIN_DEFAULT_MARGIN_GOOD_MIN", &mut margins.margin_good_min),
            ("MARGIN_DEFAULT_MARGIN_GOOD_MAX", &mut margins.margin_good_max),
            ("MARGIN_DEFAULT_MARGIN_EXCELLENT", &mut margins.margin_excellent),
        ] {
            if let Some(v) = parsed(key, var(key)) {
                *slot = v;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "margin", "orders")
            .map(|dirs| dirs.config_dir().join("recalc.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn batch_size(&self) -> usize {
        self.job.batch_size
    }

    pub fn workers(&self) -> usize {
        self.job.workers
    }

    pub fn progress_ttl(&self) -> Duration {
        Duration::from_secs(self.job.progress_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RecalcConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size(), 200);
        assert_eq!(config.workers(), 4);
        assert_eq!(
            config.default_margins.to_settings().unwrap(),
            MarginSettings::default()
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = RecalcConfig::default();
        config.job.batch_size = 0;
        assert!(config.validate().is_err());

        config.job.batch_size = 10;
        config.job.workers = MAX_WORKERS + 1;
        assert!(config.validate().is_err());

        config.job.workers = 2;
        config.default_margins.margin_poor = 50.0;
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MARGIN_RECALC_WORKERS", "8"),
            ("MARGIN_RECALC_BATCH_SIZE", "not-a-number"),
            ("MARGIN_DEFAULT_MARGIN_POOR", "5"),
        ]);
        let mut config = RecalcConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.workers(), 8);
        assert_eq!(config.batch_size(), 200);
        assert_eq!(config.default_margins.margin_poor, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RecalcConfig = toml::from_str("[job]\nworkers = 2\n").unwrap();
        assert_eq!(config.workers(), 2);
        assert_eq!(config.batch_size(), 200);
        assert_eq!(config.default_margins, DefaultMargins::default());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&RecalcConfig::default()).unwrap();
        assert!(toml_str.contains("[job]"));
        assert!(toml_str.contains("[default_margins]"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("recalc-{}.toml", uuid::Uuid::new_v4()));
        let config = RecalcConfig::load_or_default(Some(path));
        assert_eq!(config.job, JobSettings::default());
    }
}
