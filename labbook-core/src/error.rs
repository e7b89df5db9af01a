//! Error types for LABBOOK operations

use crate::{EntityId, Phase};
use thiserror::Error;

/// Input validation errors.
///
/// Raised before any computation runs: estimators fail fast rather than
/// producing NaN or infinity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

impl ValidationError {
    /// Shorthand for an [`ValidationError::InvalidInput`].
    pub fn invalid(field: &str, value: impl ToString, reason: &str) -> Self {
        ValidationError::InvalidInput {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Estimation errors for inputs that are individually in range but jointly
/// degenerate (zero baseline rate, zero minimum detectable effect).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EstimationError {
    #[error("Undefined result: {reason}")]
    UndefinedResult { reason: String },
}

/// Lifecycle model errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Unresolved status label: {label}")]
    UnresolvedStatus { label: String },

    #[error("Action {action} is not available from status {status}")]
    ActionNotAvailable { action: String, status: String },

    #[error("Record {source_id} already has a {target} successor: {successor_id}")]
    SuccessorAlreadyLinked {
        source_id: EntityId,
        target: Phase,
        successor_id: EntityId,
    },

    #[error("Record {source_id} in status {status} cannot hand off to {target}")]
    HandoffNotReady {
        source_id: EntityId,
        status: String,
        target: Phase,
    },

    #[error("Phase {phase} has no entry status for spawned records")]
    NoEntryStatus { phase: Phase },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// In-memory store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {id}")]
    NotFound { id: EntityId },

    #[error("Record already exists: {id}")]
    AlreadyExists { id: EntityId },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Master error type for all LABBOOK errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LabbookError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LabbookError {
    /// Whether the UI layer can recover locally (warn, disable an action,
    /// fall back to default display).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LabbookError::Store(StoreError::LockPoisoned))
    }
}

/// Result type alias for LABBOOK operations.
pub type LabbookResult<T> = Result<T, LabbookError>;

// =============================================================================
// TESTS
// =============================================================================
