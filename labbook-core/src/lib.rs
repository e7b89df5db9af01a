//! LABBOOK Core - Experiment Lifecycle and Estimators
//!
//! Domain types for the four-phase experimentation workflow
//! (planning, review, execution, knowledge), the hand-off rules between
//! phases, and the statistical estimators used to size and read out tests.
//!
//! Everything here is synchronous and free of I/O. Hosts (the CLI, a web
//! backend) own persistence and presentation.

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod entities;
pub mod error;
pub mod handoff;
pub mod identity;
pub mod lifecycle;
pub mod report;
pub mod stats;
pub mod store;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{
    EstimatorConfig, TestTypeMultipliers, DEFAULT_SIGNIFICANCE_THRESHOLD, DEFAULT_Z_ALPHA,
    DEFAULT_Z_BETA,
};
pub use entities::{ExperimentRecord, ObservedResults, StatusChange, SuccessorLinks};
pub use error::{
    ConfigError, EstimationError, LabbookError, LabbookResult, LifecycleError, StoreError,
    ValidationError,
};
pub use handoff::{check_handoff, spawn_successor, spawn_successor_with};
pub use identity::{fresh_entity_id, new_entity_id, EntityId, Timestamp};
pub use lifecycle::{
    available_actions, resolve_status, ColorTag, Phase, PhaseParseError, Status, StatusMeta,
    UserAction,
};
pub use report::{
    experiment_report, knowledge_hub_report, report_file_name, KnowledgeHubSummary,
    KNOWLEDGE_HUB_REPORT_FILE,
};
pub use stats::{
    estimate_duration_days, observed_significance, p_value_for_chi_square, required_sample_size,
    required_sample_size_for_power, Estimator, PowerRequest, PowerResult, SampleSizeRequest,
    SampleSizeResult, SignificanceRequest, SignificanceResult, TestType, TestTypeParseError,
};
pub use store::ExperimentStore;
