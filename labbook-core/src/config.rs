//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};

/// z-score for a two-sided alpha of 0.05.
pub const DEFAULT_Z_ALPHA: f64 = 1.96;
/// z-score for a power target of 0.8.
pub const DEFAULT_Z_BETA: f64 = 0.84;
/// p-values below this are reported as significant.
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Sample-size multipliers per test type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TestTypeMultipliers {
    pub traditional: f64,
    pub nontraditional: f64,
    pub multivariate: f64,
}

impl Default for TestTypeMultipliers {
    fn default() -> Self {
        Self {
            traditional: 1.0,
            nontraditional: 1.2,
            multivariate: 1.5,
        }
    }
}

/// Estimator configuration.
///
/// Defaults reproduce the fixed constants the dashboard has always used
/// (alpha 0.05, power 0.8). Loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EstimatorConfig {
    pub z_alpha: f64,
    pub z_beta: f64,
    pub significance_threshold: f64,
    pub multipliers: TestTypeMultipliers,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            z_alpha: DEFAULT_Z_ALPHA,
            z_beta: DEFAULT_Z_BETA,
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
            multipliers: TestTypeMultipliers::default(),
        }
    }
}

impl EstimatorConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `LABBOOK_Z_ALPHA`: z-score for the significance level (default: 1.96)
    /// - `LABBOOK_Z_BETA`: z-score for the power target (default: 0.84)
    /// - `LABBOOK_SIGNIFICANCE_THRESHOLD`: p-value cut-off (default: 0.05)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            z_alpha: std::env::var("LABBOOK_Z_ALPHA")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.z_alpha),
            z_beta: std::env::var("LABBOOK_Z_BETA")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.z_beta),
            significance_threshold: std::env::var("LABBOOK_SIGNIFICANCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.significance_threshold),
            multipliers: defaults.multipliers,
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - z_alpha and z_beta are finite and > 0
    /// - significance_threshold in (0.0, 1.0)
    /// - every multiplier is finite and >= 1.0
    pub fn validate(&self) -> LabbookResult<()> {
        for (field, value) in [("z_alpha", self.z_alpha), ("z_beta", self.z_beta)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LabbookError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: format!("{} must be a positive number", field),
                }));
            }
        }

        if !(self.significance_threshold > 0.0 && self.significance_threshold < 1.0) {
            return Err(LabbookError::Config(ConfigError::InvalidValue {
                field: "significance_threshold".to_string(),
                value: self.significance_threshold.to_string(),
                reason: "significance_threshold must be between 0.0 and 1.0".to_string(),
            }));
        }

        for (field, value) in [
            ("multipliers.traditional", self.multipliers.traditional),
            ("multipliers.nontraditional", self.multipliers.nontraditional),
            ("multipliers.multivariate", self.multipliers.multivariate),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(LabbookError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "multiplier must be at least 1.0".to_string(),
                }));
            }
        }

        Ok(())
    }

    /// Combined z-score term `(z_alpha + z_beta)^2`.
    pub fn z_sum_squared(&self) -> f64 {
        (self.z_alpha + self.z_beta).powi(2)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_from_env_overlays_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _alpha = EnvVarGuard::set("LABBOOK_Z_ALPHA", Some("2.58"));
        let _beta = EnvVarGuard::set("LABBOOK_Z_BETA", None);
        let _threshold = EnvVarGuard::set("LABBOOK_SIGNIFICANCE_THRESHOLD", Some("0.01"));

        let config = EstimatorConfig::from_env();
        let defaults = EstimatorConfig::default();
        assert_eq!(config.z_alpha, 2.58);
        assert_eq!(config.z_beta, defaults.z_beta);
        assert_eq!(config.significance_threshold, 0.01);
        assert_eq!(config.multipliers, defaults.multipliers);
    }

    #[test]
    fn test_from_env_ignores_unparseable_values() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _alpha = EnvVarGuard::set("LABBOOK_Z_ALPHA", Some("not-a-number"));
        let _beta = EnvVarGuard::set("LABBOOK_Z_BETA", Some(""));
        let _threshold = EnvVarGuard::set("LABBOOK_SIGNIFICANCE_THRESHOLD", None);

        assert_eq!(EstimatorConfig::from_env(), EstimatorConfig::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EstimatorConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.z_sum_squared() - 7.84).abs() < 1e-9);
    }

    #[test]
    fn test_config_rejects_non_positive_z() {
        let config = EstimatorConfig {
            z_alpha: 0.0,
            ..EstimatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LabbookError::Config(ConfigError::InvalidValue { field, .. })) if field == "z_alpha"
        ));
    }

    #[test]
    fn test_config_rejects_threshold_out_of_range() {
        let config = EstimatorConfig {
            significance_threshold: 1.5,
            ..EstimatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LabbookError::Config(ConfigError::InvalidValue { field, .. }))
                if field == "significance_threshold"
        ));
    }

    #[test]
    fn test_config_rejects_shrinking_multiplier() {
        let mut config = EstimatorConfig::default();
        config.multipliers.multivariate = 0.5;
        assert!(matches!(
            config.validate(),
            Err(LabbookError::Config(ConfigError::InvalidValue { field, .. }))
                if field == "multipliers.multivariate"
        ));
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
