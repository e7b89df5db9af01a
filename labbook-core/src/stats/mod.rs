//! Statistical estimators.
//!
//! Pure, synchronous functions over plain numbers. Inputs are validated up
//! front so no estimator ever returns NaN or infinity:
//! - [`sample_size`]: users per variant from baseline rate and minimum detectable effect
//! - [`power`]: users per variant from standardized effect size and standard deviation
//! - [`significance`]: 2x2 chi-square with a coarse p-value lookup

pub mod power;
pub mod sample_size;
pub mod significance;

pub use power::{PowerRequest, PowerResult, TestType, TestTypeParseError};
pub use sample_size::{estimate_duration_days, SampleSizeRequest, SampleSizeResult};
pub use significance::{p_value_for_chi_square, SignificanceRequest, SignificanceResult};

use crate::{EstimationError, EstimatorConfig, LabbookResult, ValidationError};

/// Estimators bound to a validated configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    /// Create an estimator, validating the configuration first.
    pub fn new(config: EstimatorConfig) -> LabbookResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Rate-based sample size (baseline conversion rate + MDE).
    pub fn sample_size(&self, request: &SampleSizeRequest) -> LabbookResult<SampleSizeResult> {
        sample_size::estimate(&self.config, request)
    }

    /// Effect-size based sample size.
    pub fn power(&self, request: &PowerRequest) -> LabbookResult<PowerResult> {
        power::estimate(&self.config, request)
    }

    /// Observed significance for control/treatment counts.
    pub fn significance(
        &self,
        request: &SignificanceRequest,
    ) -> LabbookResult<SignificanceResult> {
        significance::estimate(&self.config, request)
    }
}

/// Rate-based sample size with the default configuration.
pub fn required_sample_size(request: &SampleSizeRequest) -> LabbookResult<SampleSizeResult> {
    sample_size::estimate(&EstimatorConfig::default(), request)
}

/// Effect-size based sample size with the default configuration.
pub fn required_sample_size_for_power(request: &PowerRequest) -> LabbookResult<PowerResult> {
    power::estimate(&EstimatorConfig::default(), request)
}

/// Observed significance with the default configuration.
pub fn observed_significance(request: &SignificanceRequest) -> LabbookResult<SignificanceResult> {
    significance::estimate(&EstimatorConfig::default(), request)
}

fn require_finite(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::invalid(field, value, "must be a finite number"))
    }
}

fn require_positive(field: &str, value: f64) -> Result<f64, ValidationError> {
    let value = require_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::invalid(field, value, "must be greater than 0"))
    }
}

fn require_open_unit(field: &str, value: f64) -> Result<f64, ValidationError> {
    let value = require_finite(field, value)?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(ValidationError::invalid(field, value, "must be between 0 and 1 (exclusive)"))
    }
}

/// `ceil(value)` as a count of users, never below one.
///
/// Fails when the value is not finite or does not fit a `u64`.
fn users_from(value: f64) -> Result<u64, EstimationError> {
    let users = value.ceil();
    if !users.is_finite() || users >= u64::MAX as f64 {
        return Err(EstimationError::UndefinedResult {
            reason: format!("required sample size {} is not representable", value),
        });
    }
    Ok((users as u64).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigError, LabbookError};

    #[test]
    fn test_estimator_rejects_invalid_config() {
        let config = EstimatorConfig {
            z_beta: -1.0,
            ..EstimatorConfig::default()
        };
        assert!(matches!(
            Estimator::new(config),
            Err(LabbookError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_estimator_matches_free_functions() {
        let estimator = Estimator::new(EstimatorConfig::default()).unwrap();
        let request = SampleSizeRequest {
            baseline_rate: 5.0,
            minimum_detectable_effect: 20.0,
        };
        assert_eq!(
            estimator.sample_size(&request).unwrap(),
            required_sample_size(&request).unwrap()
        );
    }

    #[test]
    fn test_users_from_rounds_up_and_floors_at_one() {
        assert_eq!(users_from(31.36), Ok(32));
        assert_eq!(users_from(0.2), Ok(1));
        assert_eq!(users_from(7.0), Ok(7));
    }

    #[test]
    fn test_users_from_rejects_unrepresentable_counts() {
        for value in [f64::INFINITY, f64::NAN, u64::MAX as f64, 1e30] {
            assert!(matches!(
                users_from(value),
                Err(EstimationError::UndefinedResult { .. })
            ));
        }
    }
}
