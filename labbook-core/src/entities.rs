//! Core entity structures

use crate::{
    new_entity_id, resolve_status, EntityId, LabbookResult, LifecycleError, Phase,
    SignificanceRequest, Status, Timestamp, UserAction,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Back-references from a record to the records spawned from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SuccessorLinks {
    /// Review brief spawned from a planned roadmap item.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub brief_id: Option<EntityId>,
    /// Experiment spawned from an approved brief.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub experiment_id: Option<EntityId>,
    /// Knowledge record spawned from a completed experiment.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub knowledge_id: Option<EntityId>,
}

impl SuccessorLinks {
    /// Link slot used for successors in `phase`.
    pub fn get(&self, phase: Phase) -> Option<EntityId> {
        match phase {
            Phase::Planning => None,
            Phase::Review => self.brief_id,
            Phase::Execution => self.experiment_id,
            Phase::Knowledge => self.knowledge_id,
        }
    }

    pub(crate) fn set(&mut self, phase: Phase, id: EntityId) {
        match phase {
            Phase::Planning => {}
            Phase::Review => self.brief_id = Some(id),
            Phase::Execution => self.experiment_id = Some(id),
            Phase::Knowledge => self.knowledge_id = Some(id),
        }
    }
}

/// Observed counts for a running or finished experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ObservedResults {
    pub control_users: u64,
    pub control_conversions: u64,
    pub treatment_users: u64,
    pub treatment_conversions: u64,
}

impl From<ObservedResults> for SignificanceRequest {
    fn from(value: ObservedResults) -> Self {
        SignificanceRequest {
            control_users: value.control_users,
            control_conversions: value.control_conversions,
            treatment_users: value.treatment_users,
            treatment_conversions: value.treatment_conversions,
        }
    }
}

/// Experiment-like entity: roadmap item, brief, experiment or knowledge
/// record, depending on its phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExperimentRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub name: String,
    /// Stored status label. Core transitions always write the canonical
    /// lower-case label; imported records may carry free text.
    pub status: String,
    pub phase: Phase,
    pub goal: Option<String>,
    pub hypothesis: Option<String>,
    pub metric: Option<String>,
    pub owner: Option<String>,
    /// Record this one was spawned from.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub source_id: Option<EntityId>,
    pub links: SuccessorLinks,
    pub results: Option<ObservedResults>,
    /// Learnings captured in the knowledge phase.
    pub insights: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
}

/// Record of a single status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusChange {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub from: String,
    pub to: Status,
    pub phase: Phase,
}

impl ExperimentRecord {
    /// Create a record in `status`, with phase derived from it.
    pub fn new(name: &str, status: Status) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            name: name.to_string(),
            status: status.as_db_str().to_string(),
            phase: status.phase(),
            goal: None,
            hypothesis: None,
            metric: None,
            owner: None,
            source_id: None,
            links: SuccessorLinks::default(),
            results: None,
            insights: Vec::new(),
            created_at: now,
            updated_at: now,
            metadata: None,
        }
    }

    /// A freshly generated roadmap idea, parked in the backlog.
    pub fn new_idea(name: &str) -> Self {
        Self::new(name, Status::Backlog)
    }

    pub fn with_goal(mut self, goal: &str) -> Self {
        self.goal = Some(goal.to_string());
        self
    }

    pub fn with_hypothesis(mut self, hypothesis: &str) -> Self {
        self.hypothesis = Some(hypothesis.to_string());
        self
    }

    pub fn with_metric(mut self, metric: &str) -> Self {
        self.metric = Some(metric.to_string());
        self
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn with_results(mut self, results: ObservedResults) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_insight(mut self, insight: &str) -> Self {
        self.insights.push(insight.to_string());
        self
    }

    /// Canonical status for the stored label, if it resolves.
    pub fn resolved_status(&self) -> Option<Status> {
        resolve_status(&self.status)
    }

    /// Move the record to `status`.
    ///
    /// Any status is reachable from any other; the phase follows the status.
    pub fn transition(&mut self, status: Status) -> StatusChange {
        let change = StatusChange {
            id: self.id,
            from: std::mem::replace(&mut self.status, status.as_db_str().to_string()),
            to: status,
            phase: status.phase(),
        };
        self.phase = status.phase();
        self.updated_at = Utc::now();
        tracing::debug!(
            id = %self.id,
            from = %change.from,
            to = %status.as_db_str(),
            phase = %self.phase,
            "status transition"
        );
        change
    }

    /// Resolve `label` and transition to it.
    pub fn transition_to_label(&mut self, label: &str) -> LabbookResult<StatusChange> {
        let status = Status::from_db_str(label)?;
        Ok(self.transition(status))
    }

    /// Apply a UI action, rejecting actions not offered from the current
    /// status.
    pub fn apply_action(&mut self, action: UserAction) -> LabbookResult<StatusChange> {
        match self.resolved_status() {
            Some(current) if action.is_offered_from(current) => {
                Ok(self.transition(action.target()))
            }
            _ => Err(LifecycleError::ActionNotAvailable {
                action: action.to_string(),
                status: self.status.clone(),
            }
            .into()),
        }
    }

    /// Whether a successor has already been spawned into `phase`.
    pub fn has_successor(&self, phase: Phase) -> bool {
        self.links.get(phase).is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
