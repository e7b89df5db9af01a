//! LABBOOK Test Utilities
//!
//! Shared test infrastructure for the LABBOOK workspace:
//! - Proptest generators for lifecycle and estimator types
//! - Fixtures for records at each hand-off point
//! - Custom assertions for LABBOOK errors and invariants
//! - A seeded simulator for experiment outcomes

// Re-export core types for convenience
pub use labbook_core::{
    EntityId, EstimatorConfig, ExperimentRecord, LabbookError, LabbookResult, LifecycleError,
    ObservedResults, Phase, PowerRequest, SampleSizeRequest, SignificanceRequest, Status,
    StoreError, TestType, UserAction, ValidationError,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating LABBOOK types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a Phase variant.
    pub fn arb_phase() -> impl Strategy<Value = Phase> {
        prop::sample::select(Phase::ALL.to_vec())
    }

    /// Generate a Status variant.
    pub fn arb_status() -> impl Strategy<Value = Status> {
        prop::sample::select(Status::ALL.to_vec())
    }

    /// Generate a UserAction variant.
    pub fn arb_user_action() -> impl Strategy<Value = UserAction> {
        prop::sample::select(UserAction::ALL.to_vec())
    }

    /// Generate a TestType variant.
    pub fn arb_test_type() -> impl Strategy<Value = TestType> {
        prop_oneof![
            Just(TestType::Traditional),
            Just(TestType::Nontraditional),
            Just(TestType::Multivariate),
        ]
    }

    /// Generate a status label with random casing and padding.
    pub fn arb_status_label() -> impl Strategy<Value = String> {
        (arb_status(), any::<bool>(), 0usize..3).prop_map(|(status, upper, pad)| {
            let label = if upper {
                status.label().to_uppercase()
            } else {
                status.label().to_lowercase()
            };
            format!("{}{}{}", " ".repeat(pad), label, " ".repeat(pad))
        })
    }

    /// Generate a record name.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,30}"
    }

    /// Generate a record in a random status.
    pub fn arb_record() -> impl Strategy<Value = ExperimentRecord> {
        (arb_name(), arb_status(), proptest::option::of("[a-z ]{1,40}")).prop_map(
            |(name, status, goal)| {
                let mut record = ExperimentRecord::new(&name, status);
                record.goal = goal;
                record
            },
        )
    }

    /// Generate an in-range rate-based estimator request.
    pub fn arb_sample_size_request() -> impl Strategy<Value = SampleSizeRequest> {
        (0.1f64..50.0, 0.5f64..=100.0).prop_map(|(baseline_rate, minimum_detectable_effect)| {
            SampleSizeRequest {
                baseline_rate,
                minimum_detectable_effect,
            }
        })
    }

    /// Generate an in-range effect-size estimator request.
    pub fn arb_power_request() -> impl Strategy<Value = PowerRequest> {
        (arb_test_type(), 0.01f64..5.0, 0.01f64..10.0, 0.5f64..0.99, 0.001f64..0.2).prop_map(
            |(test_type, effect_size, standard_deviation, power, alpha)| PowerRequest {
                test_type,
                effect_size,
                standard_deviation,
                power,
                alpha,
            },
        )
    }

    /// Generate valid counts with at least one control conversion.
    pub fn arb_significance_request() -> impl Strategy<Value = SignificanceRequest> {
        (1u64..20_000, 1u64..20_000).prop_flat_map(|(nc, nt)| {
            (1..=nc, 0..=nt).prop_map(move |(cc, ct)| SignificanceRequest {
                control_users: nc,
                control_conversions: cc,
                treatment_users: nt,
                treatment_conversions: ct,
            })
        })
    }

    /// Generate a configuration that passes `validate()`.
    pub fn arb_valid_config() -> impl Strategy<Value = EstimatorConfig> {
        (0.5f64..3.5, 0.1f64..3.0, 0.001f64..0.2).prop_map(
            |(z_alpha, z_beta, significance_threshold)| EstimatorConfig {
                z_alpha,
                z_beta,
                significance_threshold,
                ..EstimatorConfig::default()
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records at each point of the lifecycle.

    use super::*;

    /// A fresh backlog idea.
    pub fn backlog_item() -> ExperimentRecord {
        ExperimentRecord::new_idea("Checkout copy")
            .with_goal("Increase checkout completion")
            .with_owner("growth")
    }

    /// A roadmap item ready to hand off into review.
    pub fn planned_item() -> ExperimentRecord {
        ExperimentRecord::new("Free shipping banner", Status::Planned)
            .with_goal("Raise average order value")
            .with_hypothesis("A visible threshold nudges larger baskets")
            .with_metric("average order value")
            .with_owner("merchandising")
    }

    /// A brief ready to hand off into execution.
    pub fn approved_brief() -> ExperimentRecord {
        ExperimentRecord::new("One-page checkout", Status::Approved)
            .with_goal("Increase checkout completion")
            .with_hypothesis("Fewer steps reduce abandonment")
            .with_metric("checkout conversion")
            .with_owner("growth")
    }

    /// An experiment collecting data.
    pub fn running_experiment() -> ExperimentRecord {
        ExperimentRecord::new("Hero image test", Status::InProgress)
            .with_goal("More signups")
            .with_metric("signup rate")
    }

    /// A finished experiment with a clear winner (1000/50 vs 1000/90).
    pub fn completed_experiment() -> ExperimentRecord {
        ExperimentRecord::new("Pricing page layout", Status::Completed)
            .with_goal("More trial starts")
            .with_hypothesis("Annual plan first increases trials")
            .with_metric("trial start rate")
            .with_results(clear_win())
    }

    /// A documented learning.
    pub fn knowledge_record() -> ExperimentRecord {
        ExperimentRecord::new("Pricing page layout", Status::Documented)
            .with_results(clear_win())
            .with_insight("Leading with the annual plan lifts trial starts")
    }

    /// 1000/50 vs 1000/65: +30%, not significant.
    pub fn modest_lift() -> ObservedResults {
        ObservedResults {
            control_users: 1000,
            control_conversions: 50,
            treatment_users: 1000,
            treatment_conversions: 65,
        }
    }

    /// 1000/50 vs 1000/90: +80%, significant.
    pub fn clear_win() -> ObservedResults {
        ObservedResults {
            control_users: 1000,
            control_conversions: 50,
            treatment_users: 1000,
            treatment_conversions: 90,
        }
    }

    /// One record in every status.
    pub fn one_of_each_status() -> Vec<ExperimentRecord> {
        Status::ALL
            .iter()
            .map(|status| ExperimentRecord::new(&format!("{} item", status.label()), *status))
            .collect()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for LABBOOK-specific validation.

    use super::*;

    /// Assert that a LabbookResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &LabbookResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a LabbookResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &LabbookResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a LabbookResult is an InvalidInput for `field`.
    #[track_caller]
    pub fn assert_invalid_input<T: std::fmt::Debug>(result: &LabbookResult<T>, field: &str) {
        match result {
            Err(LabbookError::Validation(ValidationError::InvalidInput { field: f, .. })) => {
                assert_eq!(f, field, "Wrong field in InvalidInput error");
            }
            other => panic!("Expected InvalidInput for {}, got: {:?}", field, other),
        }
    }

    /// Assert that a LabbookResult is an UndefinedResult estimation error.
    #[track_caller]
    pub fn assert_undefined_result<T: std::fmt::Debug>(result: &LabbookResult<T>) {
        match result {
            Err(LabbookError::Estimation(_)) => {}
            other => panic!("Expected UndefinedResult, got: {:?}", other),
        }
    }

    /// Assert that a LabbookResult is a lifecycle error.
    #[track_caller]
    pub fn assert_lifecycle_error<T: std::fmt::Debug>(result: &LabbookResult<T>) {
        match result {
            Err(LabbookError::Lifecycle(_)) => {}
            other => panic!("Expected Lifecycle error, got: {:?}", other),
        }
    }

    /// Assert that a LabbookResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &LabbookResult<T>) {
        match result {
            Err(LabbookError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that a LabbookResult is a NotFound store error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &LabbookResult<T>) {
        match result {
            Err(LabbookError::Store(StoreError::NotFound { .. })) => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    /// Assert that a record's status resolves to `expected` and its phase matches.
    #[track_caller]
    pub fn assert_status(record: &ExperimentRecord, expected: Status) {
        assert_eq!(
            record.resolved_status(),
            Some(expected),
            "Expected status {}, got {:?}",
            expected,
            record.status
        );
        assert_eq!(
            record.phase,
            expected.phase(),
            "Phase does not match status {}",
            expected
        );
    }

    /// Assert that `successor` was spawned from `source` into `phase`.
    #[track_caller]
    pub fn assert_spawned_from(
        source: &ExperimentRecord,
        successor: &ExperimentRecord,
        phase: Phase,
    ) {
        assert_ne!(source.id, successor.id, "Successor must have a new id");
        assert_eq!(successor.source_id, Some(source.id), "Missing back-reference");
        assert_eq!(successor.phase, phase, "Successor in wrong phase");
        assert_eq!(
            source.links.get(phase),
            Some(successor.id),
            "Source not annotated with successor id"
        );
        if let Some(entry) = phase.entry_status() {
            assert_status(successor, entry);
        }
    }
}

// ============================================================================
// OUTCOME SIMULATOR
// ============================================================================

pub mod simulate {
    //! Seeded generator for plausible experiment outcomes.
    //!
    //! Demo and test data only. The same seed always yields the same counts.

    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Control conversion rates drawn by the simulator, as fractions.
    const CONTROL_RATE_RANGE: std::ops::Range<f64> = 0.02..0.12;
    /// Relative lift of treatment over control, as fractions.
    const LIFT_RANGE: std::ops::Range<f64> = -0.2..0.6;

    /// Deterministic outcome generator.
    #[derive(Debug, Clone)]
    pub struct OutcomeSimulator {
        rng: StdRng,
    }

    impl OutcomeSimulator {
        pub fn new(seed: u64) -> Self {
            Self {
                rng: StdRng::seed_from_u64(seed),
            }
        }

        /// Counts for two groups of `users_per_variant` users each.
        pub fn results(&mut self, users_per_variant: u64) -> ObservedResults {
            let users = users_per_variant.max(1);
            let control_rate = self.rng.random_range(CONTROL_RATE_RANGE);
            let lift = self.rng.random_range(LIFT_RANGE);
            let treatment_rate = (control_rate * (1.0 + lift)).clamp(0.0, 1.0);

            ObservedResults {
                control_users: users,
                control_conversions: self.conversions(users, control_rate),
                treatment_users: users,
                treatment_conversions: self.conversions(users, treatment_rate),
            }
        }

        /// Binomial-ish draw: the expected count plus bounded noise.
        fn conversions(&mut self, users: u64, rate: f64) -> u64 {
            let expected = users as f64 * rate;
            let spread = expected.sqrt();
            let noise = self.rng.random_range(-1.0..=1.0) * spread;
            // At least one conversion so relative lift stays defined.
            ((expected + noise).round() as u64).clamp(1, users)
        }

        /// Fill in results and mark the record completed.
        pub fn complete(
            &mut self,
            record: &mut ExperimentRecord,
            users_per_variant: u64,
        ) -> ObservedResults {
            let results = self.results(users_per_variant);
            record.results = Some(results);
            record.transition(Status::Completed);
            results
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
