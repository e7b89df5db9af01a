//! Effect-size based sample-size estimation.

use super::{require_open_unit, require_positive, users_from};
use crate::{EstimatorConfig, LabbookResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of test being planned. More complex designs need more users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Traditional,
    Nontraditional,
    Multivariate,
}

impl TestType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TestType::Traditional => "traditional",
            TestType::Nontraditional => "nontraditional",
            TestType::Multivariate => "multivariate",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, TestTypeParseError> {
        match s.trim().to_lowercase().as_str() {
            "traditional" => Ok(TestType::Traditional),
            "nontraditional" | "non-traditional" => Ok(TestType::Nontraditional),
            "multivariate" => Ok(TestType::Multivariate),
            _ => Err(TestTypeParseError(s.to_string())),
        }
    }

    /// Sample-size multiplier for this test type.
    pub fn multiplier(&self, config: &EstimatorConfig) -> f64 {
        match self {
            TestType::Traditional => config.multipliers.traditional,
            TestType::Nontraditional => config.multipliers.nontraditional,
            TestType::Multivariate => config.multipliers.multivariate,
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for TestType {
    type Err = TestTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid test type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTypeParseError(pub String);

impl fmt::Display for TestTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid test type: {}", self.0)
    }
}

impl std::error::Error for TestTypeParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PowerRequest {
    pub test_type: TestType,
    /// Standardized expected effect size, > 0.
    pub effect_size: f64,
    /// Standard deviation of the metric, > 0.
    pub standard_deviation: f64,
    /// Desired power, 0 < power < 1.
    pub power: f64,
    /// Significance level, 0 < alpha < 1.
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PowerResult {
    pub users_per_variant: u64,
    pub test_type: TestType,
    pub multiplier: f64,
}

/// n = ceil((z_alpha + z_beta)^2 * sigma^2 / d^2 * multiplier)
///
/// `power` and `alpha` are validated but the z-scores come from the
/// configuration, not from the requested values.
pub(crate) fn estimate(
    config: &EstimatorConfig,
    request: &PowerRequest,
) -> LabbookResult<PowerResult> {
    let effect_size = require_positive("effect_size", request.effect_size)?;
    let sigma = require_positive("standard_deviation", request.standard_deviation)?;
    require_open_unit("power", request.power)?;
    require_open_unit("alpha", request.alpha)?;

    let base = config.z_sum_squared() * sigma.powi(2) / effect_size.powi(2);
    let multiplier = request.test_type.multiplier(config);
    let users_per_variant = users_from(base * multiplier)?;

    tracing::debug!(
        test_type = %request.test_type,
        effect_size,
        standard_deviation = sigma,
        users_per_variant,
        "estimated effect-size sample size"
    );

    Ok(PowerResult {
        users_per_variant,
        test_type: request.test_type,
        multiplier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EstimationError, LabbookError, ValidationError};

    fn request(test_type: TestType, effect_size: f64, standard_deviation: f64) -> PowerRequest {
        PowerRequest {
            test_type,
            effect_size,
            standard_deviation,
            power: 0.8,
            alpha: 0.05,
        }
    }

    fn users(test_type: TestType, d: f64, sigma: f64) -> u64 {
        estimate(&EstimatorConfig::default(), &request(test_type, d, sigma))
            .unwrap()
            .users_per_variant
    }

    #[test]
    fn test_known_values() {
        assert_eq!(users(TestType::Traditional, 0.5, 1.0), 32);
        assert_eq!(users(TestType::Nontraditional, 0.5, 1.0), 38);
        assert_eq!(users(TestType::Multivariate, 0.5, 1.0), 48);
        assert_eq!(users(TestType::Traditional, 0.3, 2.0), 349);
    }

    #[test]
    fn test_result_reports_multiplier() {
        let result =
            estimate(&EstimatorConfig::default(), &request(TestType::Multivariate, 0.5, 1.0))
                .unwrap();
        assert_eq!(result.test_type, TestType::Multivariate);
        assert!((result.multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let config = EstimatorConfig::default();
        for (d, sigma) in [(0.0, 1.0), (-0.5, 1.0), (0.5, 0.0), (0.5, -2.0), (f64::NAN, 1.0)] {
            let result = estimate(&config, &request(TestType::Traditional, d, sigma));
            assert!(matches!(
                result,
                Err(LabbookError::Validation(ValidationError::InvalidInput { .. }))
            ));
        }
    }

    #[test]
    fn test_extreme_ratios_are_undefined() {
        let config = EstimatorConfig::default();
        for (d, sigma) in [(1e-200, 1.0), (1.0, 1e200), (1e-10, 1e10)] {
            let result = estimate(&config, &request(TestType::Traditional, d, sigma));
            assert!(
                matches!(
                    result,
                    Err(LabbookError::Estimation(EstimationError::UndefinedResult { .. }))
                ),
                "expected undefined result for d={d}, sigma={sigma}"
            );
        }
    }

    #[test]
    fn test_rejects_power_and_alpha_outside_unit_interval() {
        let config = EstimatorConfig::default();
        let mut req = request(TestType::Traditional, 0.5, 1.0);
        req.power = 1.0;
        assert!(estimate(&config, &req).is_err());
        req.power = 0.8;
        req.alpha = 0.0;
        assert!(estimate(&config, &req).is_err());
    }

    #[test]
    fn test_test_type_parsing() {
        assert_eq!("Multivariate".parse::<TestType>().unwrap(), TestType::Multivariate);
        assert_eq!(
            TestType::from_db_str("non-traditional").unwrap(),
            TestType::Nontraditional
        );
        assert!(TestType::from_db_str("bandit").is_err());
    }
}
