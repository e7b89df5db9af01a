//! Property-Based Tests for the Statistical Estimators
//!
//! For any in-range input the estimators SHALL return a finite, positive
//! sample size, order test types by their multipliers, and report the same
//! significance when the control and treatment groups are swapped.

use labbook_core::{
    observed_significance, required_sample_size, required_sample_size_for_power, Estimator,
    EstimatorConfig, PowerRequest, SampleSizeRequest, SignificanceRequest, TestType,
};
use labbook_test_utils::assertions::{assert_invalid_input, assert_undefined_result};
use labbook_test_utils::fixtures;
use labbook_test_utils::generators::{
    arb_power_request, arb_sample_size_request, arb_significance_request, arb_valid_config,
};
use labbook_test_utils::simulate::OutcomeSimulator;
use proptest::prelude::*;

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn sample_size_for_two_and_a_half_percent_baseline() {
    let result = required_sample_size(&SampleSizeRequest {
        baseline_rate: 2.5,
        minimum_detectable_effect: 10.0,
    })
    .unwrap();
    assert_eq!(result.users_per_variant, 64_128);
}

#[test]
fn modest_lift_reads_out_as_not_significant() {
    let result = observed_significance(&fixtures::modest_lift().into()).unwrap();
    assert!((result.improvement - 30.0).abs() < 1e-9);
    assert!((result.chi_square - 2.08).abs() < 0.01);
    assert_eq!(result.p_value, 0.08);
    assert!((result.confidence - 92.0).abs() < 1e-9);
    assert!(!result.significant);
}

#[test]
fn clear_win_reads_out_as_significant() {
    let result = observed_significance(&fixtures::clear_win().into()).unwrap();
    assert!((result.improvement - 80.0).abs() < 1e-9);
    assert_eq!(result.p_value, 0.001);
    assert!((result.confidence - 99.9).abs() < 1e-9);
    assert!(result.significant);
}

#[test]
fn invalid_inputs_name_the_offending_field() {
    assert_invalid_input(
        &required_sample_size(&SampleSizeRequest {
            baseline_rate: 0.0,
            minimum_detectable_effect: 10.0,
        }),
        "baseline_rate",
    );
    assert_invalid_input(
        &required_sample_size_for_power(&PowerRequest {
            test_type: TestType::Traditional,
            effect_size: 0.5,
            standard_deviation: -1.0,
            power: 0.8,
            alpha: 0.05,
        }),
        "standard_deviation",
    );
    assert_invalid_input(
        &observed_significance(&SignificanceRequest {
            control_users: 100,
            control_conversions: 150,
            treatment_users: 100,
            treatment_conversions: 5,
        }),
        "control_conversions",
    );
}

#[test]
fn degenerate_inputs_are_undefined() {
    assert_undefined_result(&required_sample_size(&SampleSizeRequest {
        baseline_rate: 5.0,
        minimum_detectable_effect: 0.0,
    }));
    assert_undefined_result(&observed_significance(&SignificanceRequest {
        control_users: 100,
        control_conversions: 0,
        treatment_users: 100,
        treatment_conversions: 7,
    }));
}

#[test]
fn precision_degenerate_inputs_are_undefined_not_saturated() {
    assert_undefined_result(&required_sample_size(&SampleSizeRequest {
        baseline_rate: 2.5,
        minimum_detectable_effect: 1e-17,
    }));
    assert_undefined_result(&required_sample_size_for_power(&PowerRequest {
        test_type: TestType::Traditional,
        effect_size: 1e-200,
        standard_deviation: 1.0,
        power: 0.8,
        alpha: 0.05,
    }));
}

#[test]
fn huge_counts_read_out_without_overflow() {
    let half = u64::MAX / 2 + 1;
    let result = observed_significance(&SignificanceRequest {
        control_users: u64::MAX,
        control_conversions: half,
        treatment_users: u64::MAX,
        treatment_conversions: half,
    })
    .unwrap();
    assert!(result.chi_square.is_finite());
    assert!(!result.significant);
}

#[test]
fn stricter_threshold_changes_only_the_verdict() {
    let strict = Estimator::new(EstimatorConfig {
        significance_threshold: 0.001,
        ..EstimatorConfig::default()
    })
    .unwrap();
    let loose = Estimator::new(EstimatorConfig::default()).unwrap();
    let request: SignificanceRequest = fixtures::clear_win().into();

    let strict_result = strict.significance(&request).unwrap();
    let loose_result = loose.significance(&request).unwrap();
    assert_eq!(strict_result.p_value, loose_result.p_value);
    assert!(loose_result.significant);
    assert!(!strict_result.significant);
}

#[test]
fn simulated_outcomes_always_read_out() {
    let mut sim = OutcomeSimulator::new(2024);
    for _ in 0..50 {
        let results = sim.results(3_000);
        let readout = observed_significance(&results.into()).unwrap();
        assert!(readout.chi_square.is_finite());
        assert!(readout.p_value > 0.0 && readout.p_value <= 1.0);
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rate-based sample size is positive and finite for in-range inputs.
    #[test]
    fn prop_sample_size_is_positive(request in arb_sample_size_request()) {
        let result = required_sample_size(&request).unwrap();
        prop_assert!(result.users_per_variant >= 1);
        prop_assert_eq!(result.total_users, result.users_per_variant * 2);
    }

    /// Effect-size estimate never drops below one user.
    #[test]
    fn prop_power_is_positive(request in arb_power_request()) {
        let result = required_sample_size_for_power(&request).unwrap();
        prop_assert!(result.users_per_variant >= 1);
        prop_assert!(result.multiplier >= 1.0);
    }

    /// Swapping groups keeps chi-square and p-value when both groups converted.
    #[test]
    fn prop_significance_swap_symmetry(request in arb_significance_request()) {
        prop_assume!(request.treatment_conversions > 0);
        let forward = observed_significance(&request).unwrap();
        let backward = observed_significance(&request.swapped()).unwrap();
        prop_assert_eq!(forward.chi_square, backward.chi_square);
        prop_assert_eq!(forward.p_value, backward.p_value);
    }

    /// Any valid configuration produces a working estimator.
    #[test]
    fn prop_valid_config_builds_estimator(config in arb_valid_config()) {
        let estimator = Estimator::new(config).unwrap();
        let result = estimator.power(&PowerRequest {
            test_type: TestType::Traditional,
            effect_size: 0.5,
            standard_deviation: 1.0,
            power: 0.8,
            alpha: 0.05,
        });
        prop_assert!(result.is_ok());
    }
}
