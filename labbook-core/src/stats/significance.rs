//! Observed significance for a two-variant conversion test.
//!
//! The chi-square statistic is mapped to a p-value through a fixed
//! breakpoint table, not a chi-square CDF. Results are coarse by construction
//! and must stay that way so numbers match what users have already seen.

use crate::{EstimationError, EstimatorConfig, LabbookResult, ValidationError};
use serde::{Deserialize, Serialize};

/// (upper bound on chi-square, p-value) pairs, checked in order.
const P_VALUE_BREAKPOINTS: [(f64, f64); 5] = [
    (1.0, 0.30),
    (2.0, 0.15),
    (3.0, 0.08),
    (4.0, 0.04),
    (6.0, 0.01),
];
/// p-value for any chi-square at or above the last breakpoint.
const P_VALUE_FLOOR: f64 = 0.001;
/// p-value reported when the test is degenerate.
const P_VALUE_NONE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignificanceRequest {
    pub control_users: u64,
    pub control_conversions: u64,
    pub treatment_users: u64,
    pub treatment_conversions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignificanceResult {
    /// Control conversion rate, percent.
    pub control_rate: f64,
    /// Treatment conversion rate, percent.
    pub treatment_rate: f64,
    /// Relative lift of treatment over control, percent (signed).
    pub improvement: f64,
    pub chi_square: f64,
    pub p_value: f64,
    /// 100 * (1 - p)
    pub confidence: f64,
    pub significant: bool,
}

impl SignificanceRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.control_users == 0 {
            return Err(ValidationError::invalid(
                "control_users",
                self.control_users,
                "must be greater than 0",
            ));
        }
        if self.treatment_users == 0 {
            return Err(ValidationError::invalid(
                "treatment_users",
                self.treatment_users,
                "must be greater than 0",
            ));
        }
        if self.control_conversions > self.control_users {
            return Err(ValidationError::invalid(
                "control_conversions",
                self.control_conversions,
                "must not exceed control_users",
            ));
        }
        if self.treatment_conversions > self.treatment_users {
            return Err(ValidationError::invalid(
                "treatment_conversions",
                self.treatment_conversions,
                "must not exceed treatment_users",
            ));
        }
        Ok(())
    }

    /// Same counts with the group labels swapped.
    pub fn swapped(&self) -> Self {
        Self {
            control_users: self.treatment_users,
            control_conversions: self.treatment_conversions,
            treatment_users: self.control_users,
            treatment_conversions: self.control_conversions,
        }
    }
}

/// Map a chi-square statistic to the approximate p-value bucket.
pub fn p_value_for_chi_square(chi_square: f64) -> f64 {
    P_VALUE_BREAKPOINTS
        .iter()
        .find(|(bound, _)| chi_square < *bound)
        .map(|(_, p)| *p)
        .unwrap_or(P_VALUE_FLOOR)
}

/// Chi-square contribution of one group's two cells.
///
/// Summing per-group contributions keeps the statistic bit-identical when
/// the groups are swapped.
fn group_contribution(users: f64, conversions: f64, pooled_rate: f64) -> Option<f64> {
    let expected_converted = users * pooled_rate;
    let expected_missed = users - expected_converted;
    if expected_converted <= 0.0 || expected_missed <= 0.0 {
        return None;
    }
    let missed = users - conversions;
    Some(
        (conversions - expected_converted).powi(2) / expected_converted
            + (missed - expected_missed).powi(2) / expected_missed,
    )
}

pub(crate) fn estimate(
    config: &EstimatorConfig,
    request: &SignificanceRequest,
) -> LabbookResult<SignificanceResult> {
    request.validate()?;

    let nc = request.control_users as f64;
    let cc = request.control_conversions as f64;
    let nt = request.treatment_users as f64;
    let ct = request.treatment_conversions as f64;

    let control_rate = cc / nc;
    let treatment_rate = ct / nt;

    if request.control_conversions == 0 && request.treatment_conversions == 0 {
        return Ok(not_significant(0.0, 0.0, 0.0));
    }
    if request.control_conversions == 0 {
        return Err(EstimationError::UndefinedResult {
            reason: "control conversion rate is 0; relative improvement is undefined".to_string(),
        }
        .into());
    }

    let improvement = (treatment_rate - control_rate) / control_rate * 100.0;
    let pooled_rate = (cc + ct) / (nc + nt);

    let contributions = group_contribution(nc, cc, pooled_rate)
        .zip(group_contribution(nt, ct, pooled_rate));
    let Some((control_part, treatment_part)) = contributions else {
        // An expected cell of zero: every user converted.
        return Ok(not_significant(
            control_rate * 100.0,
            treatment_rate * 100.0,
            improvement,
        ));
    };

    let chi_square = control_part + treatment_part;
    let p_value = p_value_for_chi_square(chi_square);
    let result = SignificanceResult {
        control_rate: control_rate * 100.0,
        treatment_rate: treatment_rate * 100.0,
        improvement,
        chi_square,
        p_value,
        confidence: 100.0 * (1.0 - p_value),
        significant: p_value < config.significance_threshold,
    };

    tracing::debug!(
        chi_square,
        p_value,
        improvement,
        significant = result.significant,
        "computed significance"
    );

    Ok(result)
}

fn not_significant(control_rate: f64, treatment_rate: f64, improvement: f64) -> SignificanceResult {
    SignificanceResult {
        control_rate,
        treatment_rate,
        improvement,
        chi_square: 0.0,
        p_value: P_VALUE_NONE,
        confidence: 0.0,
        significant: false,
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_request() -> impl Strategy<Value = SignificanceRequest> {
        (1u64..5_000, 1u64..5_000).prop_flat_map(|(nc, nt)| {
            (1..=nc, 1..=nt).prop_map(move |(cc, ct)| SignificanceRequest {
                control_users: nc,
                control_conversions: cc,
                treatment_users: nt,
                treatment_conversions: ct,
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Swapping groups keeps chi-square and p, and flips the sign of the lift.
        #[test]
        fn prop_swap_keeps_p_value(request in arb_request()) {
            let config = EstimatorConfig::default();
            let forward = estimate(&config, &request).unwrap();
            let backward = estimate(&config, &request.swapped()).unwrap();

            prop_assert_eq!(forward.chi_square, backward.chi_square);
            prop_assert_eq!(forward.p_value, backward.p_value);
            prop_assert_eq!(forward.significant, backward.significant);
            if forward.improvement > 0.0 {
                prop_assert!(backward.improvement < 0.0);
            } else if forward.improvement < 0.0 {
                prop_assert!(backward.improvement > 0.0);
            }
        }

        /// Confidence and significance always agree with the p-value.
        #[test]
        fn prop_confidence_tracks_p_value(request in arb_request()) {
            let result = estimate(&EstimatorConfig::default(), &request).unwrap();
            prop_assert!(result.p_value > 0.0 && result.p_value <= 1.0);
            prop_assert!((result.confidence - 100.0 * (1.0 - result.p_value)).abs() < 1e-9);
            prop_assert_eq!(result.significant, result.p_value < 0.05);
            prop_assert!(result.chi_square.is_finite());
        }
    }
}
