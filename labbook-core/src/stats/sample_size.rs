//! Rate-based sample-size estimation.

use super::{require_finite, users_from};
use crate::{EstimationError, EstimatorConfig, LabbookResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Number of variants in a classic A/B test.
const AB_VARIANTS: u64 = 2;

/// Inputs for the rate-based estimator. Both values are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SampleSizeRequest {
    /// Baseline conversion rate, 0 < r < 100.
    pub baseline_rate: f64,
    /// Relative lift to detect, 0 < m <= 100.
    pub minimum_detectable_effect: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SampleSizeResult {
    pub users_per_variant: u64,
    /// Users across both variants of an A/B test.
    pub total_users: u64,
}

impl SampleSizeRequest {
    fn validate(&self) -> LabbookResult<(f64, f64)> {
        let rate = require_finite("baseline_rate", self.baseline_rate)?;
        if rate <= 0.0 || rate >= 100.0 {
            return Err(ValidationError::invalid(
                "baseline_rate",
                rate,
                "must be between 0 and 100 (exclusive)",
            )
            .into());
        }

        let mde = require_finite("minimum_detectable_effect", self.minimum_detectable_effect)?;
        if mde < 0.0 || mde > 100.0 {
            return Err(ValidationError::invalid(
                "minimum_detectable_effect",
                mde,
                "must be between 0 and 100",
            )
            .into());
        }
        if mde == 0.0 {
            return Err(EstimationError::UndefinedResult {
                reason: "minimum detectable effect of 0 has no finite sample size".to_string(),
            }
            .into());
        }

        Ok((rate, mde))
    }
}

/// n = ceil(2 * pBar(1 - pBar) * (z_alpha + z_beta)^2 / (p2 - p1)^2)
pub(crate) fn estimate(
    config: &EstimatorConfig,
    request: &SampleSizeRequest,
) -> LabbookResult<SampleSizeResult> {
    let (rate, mde) = request.validate()?;

    let p1 = rate / 100.0;
    let p2 = p1 * (1.0 + mde / 100.0);
    if p2 > 1.0 {
        return Err(EstimationError::UndefinedResult {
            reason: format!(
                "baseline {}% lifted by {}% exceeds a 100% conversion rate",
                rate, mde
            ),
        }
        .into());
    }
    if p2 <= p1 {
        return Err(EstimationError::UndefinedResult {
            reason: format!(
                "lift of {}% does not change a {}% baseline at double precision",
                mde, rate
            ),
        }
        .into());
    }

    let p_bar = (p1 + p2) / 2.0;
    let variance = p_bar * (1.0 - p_bar);
    let n = 2.0 * variance * config.z_sum_squared() / (p2 - p1).powi(2);

    let users_per_variant = users_from(n)?;
    tracing::debug!(
        baseline_rate = rate,
        minimum_detectable_effect = mde,
        users_per_variant,
        "estimated rate-based sample size"
    );

    Ok(SampleSizeResult {
        users_per_variant,
        total_users: users_per_variant.saturating_mul(AB_VARIANTS),
    })
}

/// Days needed to enrol `users_per_variant` in each of `variants` arms at
/// `daily_traffic` users per day.
pub fn estimate_duration_days(
    users_per_variant: u64,
    variants: u32,
    daily_traffic: u64,
) -> LabbookResult<u64> {
    if variants == 0 {
        return Err(ValidationError::invalid("variants", variants, "must be greater than 0").into());
    }
    if daily_traffic == 0 {
        return Err(
            ValidationError::invalid("daily_traffic", daily_traffic, "must be greater than 0")
                .into(),
        );
    }

    let total = users_per_variant.saturating_mul(u64::from(variants));
    Ok(total.div_ceil(daily_traffic))
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Sample size is always a positive integer for in-range inputs.
        #[test]
        fn prop_sample_size_positive(r in 0.1f64..50.0, m in 0.5f64..=100.0) {
            let result = estimate(&EstimatorConfig::default(), &SampleSizeRequest {
                baseline_rate: r,
                minimum_detectable_effect: m,
            }).unwrap();
            prop_assert!(result.users_per_variant >= 1);
        }

        /// A smaller effect never needs fewer users.
        #[test]
        fn prop_sample_size_grows_as_effect_shrinks(
            r in 0.1f64..50.0,
            m in 1.0f64..=100.0,
            shrink in 0.01f64..1.0,
        ) {
            let config = EstimatorConfig::default();
            let larger = estimate(&config, &SampleSizeRequest {
                baseline_rate: r,
                minimum_detectable_effect: m,
            }).unwrap();
            let smaller = estimate(&config, &SampleSizeRequest {
                baseline_rate: r,
                minimum_detectable_effect: m * shrink,
            }).unwrap();
            prop_assert!(smaller.users_per_variant >= larger.users_per_variant);
        }
    }
}
