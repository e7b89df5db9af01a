//! Lifecycle phases, statuses and user actions.
//!
//! The lifecycle has four macro-phases, each holding three statuses. The
//! global order index (1-12) is for display and sorting only; it never gates
//! a transition.

use crate::LifecycleError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PHASE
// ============================================================================

/// Macro-stage of the experiment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Planning,
    Review,
    Execution,
    Knowledge,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Phase; 4] = [
        Phase::Planning,
        Phase::Review,
        Phase::Execution,
        Phase::Knowledge,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Phase::Planning => "planning",
            Phase::Review => "review",
            Phase::Execution => "execution",
            Phase::Knowledge => "knowledge",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, PhaseParseError> {
        match s.trim().to_lowercase().as_str() {
            "planning" => Ok(Phase::Planning),
            "review" => Ok(Phase::Review),
            "execution" => Ok(Phase::Execution),
            "knowledge" => Ok(Phase::Knowledge),
            _ => Err(PhaseParseError(s.to_string())),
        }
    }

    /// Statuses belonging to this phase, in order.
    pub fn statuses(&self) -> [Status; 3] {
        match self {
            Phase::Planning => [Status::Draft, Status::Backlog, Status::Planned],
            Phase::Review => [Status::UnderReview, Status::NeedsRevision, Status::Approved],
            Phase::Execution => [Status::InProgress, Status::Paused, Status::Completed],
            Phase::Knowledge => [Status::Analyzing, Status::Documented, Status::Applied],
        }
    }

    /// Status a spawned successor starts in. Planning records are created
    /// directly by the user, never spawned.
    pub fn entry_status(&self) -> Option<Status> {
        match self {
            Phase::Planning => None,
            Phase::Review => Some(Status::UnderReview),
            Phase::Execution => Some(Status::InProgress),
            Phase::Knowledge => Some(Status::Documented),
        }
    }

    /// Status the predecessor must hold before handing off into this phase.
    pub fn handoff_source_status(&self) -> Option<Status> {
        match self {
            Phase::Planning => None,
            Phase::Review => Some(Status::Planned),
            Phase::Execution => Some(Status::Approved),
            Phase::Knowledge => Some(Status::Completed),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid phase string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseParseError(pub String);

impl fmt::Display for PhaseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid phase: {}", self.0)
    }
}

impl std::error::Error for PhaseParseError {}

// ============================================================================
// STATUS
// ============================================================================

/// Presentation hint attached to each status. Not a core concern; carried so
/// the UI can color badges consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Gray,
    Slate,
    Blue,
    Yellow,
    Orange,
    Green,
    Purple,
    Indigo,
    Emerald,
}

/// Fine-grained state within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Backlog,
    Planned,
    #[serde(rename = "under review")]
    UnderReview,
    #[serde(rename = "needs revision")]
    NeedsRevision,
    Approved,
    #[serde(rename = "in progress")]
    InProgress,
    Paused,
    Completed,
    Analyzing,
    Documented,
    Applied,
}

impl Status {
    /// All statuses in canonical progression order.
    pub const ALL: [Status; 12] = [
        Status::Draft,
        Status::Backlog,
        Status::Planned,
        Status::UnderReview,
        Status::NeedsRevision,
        Status::Approved,
        Status::InProgress,
        Status::Paused,
        Status::Completed,
        Status::Analyzing,
        Status::Documented,
        Status::Applied,
    ];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Backlog => "Backlog",
            Status::Planned => "Planned",
            Status::UnderReview => "Under Review",
            Status::NeedsRevision => "Needs Revision",
            Status::Approved => "Approved",
            Status::InProgress => "In Progress",
            Status::Paused => "Paused",
            Status::Completed => "Completed",
            Status::Analyzing => "Analyzing",
            Status::Documented => "Documented",
            Status::Applied => "Applied",
        }
    }

    /// Canonical stored form: the label, lower-cased.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Backlog => "backlog",
            Status::Planned => "planned",
            Status::UnderReview => "under review",
            Status::NeedsRevision => "needs revision",
            Status::Approved => "approved",
            Status::InProgress => "in progress",
            Status::Paused => "paused",
            Status::Completed => "completed",
            Status::Analyzing => "analyzing",
            Status::Documented => "documented",
            Status::Applied => "applied",
        }
    }

    /// Parse a stored or free-text label.
    pub fn from_db_str(s: &str) -> Result<Self, LifecycleError> {
        resolve_status(s).ok_or_else(|| LifecycleError::UnresolvedStatus {
            label: s.to_string(),
        })
    }

    /// Global ordering index, 1-12.
    pub fn order(&self) -> u8 {
        match self {
            Status::Draft => 1,
            Status::Backlog => 2,
            Status::Planned => 3,
            Status::UnderReview => 4,
            Status::NeedsRevision => 5,
            Status::Approved => 6,
            Status::InProgress => 7,
            Status::Paused => 8,
            Status::Completed => 9,
            Status::Analyzing => 10,
            Status::Documented => 11,
            Status::Applied => 12,
        }
    }

    /// Phase this status belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Status::Draft | Status::Backlog | Status::Planned => Phase::Planning,
            Status::UnderReview | Status::NeedsRevision | Status::Approved => Phase::Review,
            Status::InProgress | Status::Paused | Status::Completed => Phase::Execution,
            Status::Analyzing | Status::Documented | Status::Applied => Phase::Knowledge,
        }
    }

    pub fn color_tag(&self) -> ColorTag {
        match self {
            Status::Draft => ColorTag::Gray,
            Status::Backlog => ColorTag::Slate,
            Status::Planned => ColorTag::Blue,
            Status::UnderReview => ColorTag::Yellow,
            Status::NeedsRevision => ColorTag::Orange,
            Status::Approved => ColorTag::Green,
            Status::InProgress => ColorTag::Blue,
            Status::Paused => ColorTag::Yellow,
            Status::Completed => ColorTag::Green,
            Status::Analyzing => ColorTag::Purple,
            Status::Documented => ColorTag::Indigo,
            Status::Applied => ColorTag::Emerald,
        }
    }

    /// Check if this is a terminal state within its phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Applied)
    }

    /// Metadata snapshot for display layers.
    pub fn meta(&self) -> StatusMeta {
        StatusMeta {
            status: *self,
            label: self.label(),
            order: self.order(),
            phase: self.phase(),
            color: self.color_tag(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Status {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Display metadata for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    pub status: Status,
    pub label: &'static str,
    pub order: u8,
    pub phase: Phase,
    pub color: ColorTag,
}

// ============================================================================
// STATUS CATALOG
// ============================================================================

/// Flat lookup table from normalized label to status, built once.
static STATUS_CATALOG: Lazy<HashMap<String, Status>> = Lazy::new(|| {
    Status::ALL
        .iter()
        .map(|status| (normalize_label(status.label()), *status))
        .collect()
});

fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive lookup of a status by display label.
///
/// Returns `None` for labels that match nothing; those are still valid display
/// strings and get a generic, unstyled badge.
pub fn resolve_status(label: &str) -> Option<Status> {
    STATUS_CATALOG.get(&normalize_label(label)).copied()
}

// ============================================================================
// USER ACTIONS
// ============================================================================

/// Forward transitions the UI offers. The model itself accepts any
/// transition; actions are the guided path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    /// Backlog -> Draft
    Promote,
    /// Draft -> Planned
    Schedule,
    /// Under Review / Needs Revision -> Approved
    Approve,
    /// Under Review -> Needs Revision
    RequestRevision,
    /// Needs Revision -> Under Review
    Resubmit,
    /// In Progress -> Paused
    Pause,
    /// Paused -> In Progress
    Resume,
    /// In Progress / Paused -> Completed
    Complete,
    /// Documented -> Applied
    Apply,
}

impl UserAction {
    pub const ALL: [UserAction; 9] = [
        UserAction::Promote,
        UserAction::Schedule,
        UserAction::Approve,
        UserAction::RequestRevision,
        UserAction::Resubmit,
        UserAction::Pause,
        UserAction::Resume,
        UserAction::Complete,
        UserAction::Apply,
    ];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            UserAction::Promote => "promote",
            UserAction::Schedule => "schedule",
            UserAction::Approve => "approve",
            UserAction::RequestRevision => "request_revision",
            UserAction::Resubmit => "resubmit",
            UserAction::Pause => "pause",
            UserAction::Resume => "resume",
            UserAction::Complete => "complete",
            UserAction::Apply => "apply",
        }
    }

    /// Status the action moves a record into.
    pub fn target(&self) -> Status {
        match self {
            UserAction::Promote => Status::Draft,
            UserAction::Schedule => Status::Planned,
            UserAction::Approve => Status::Approved,
            UserAction::RequestRevision => Status::NeedsRevision,
            UserAction::Resubmit => Status::UnderReview,
            UserAction::Pause => Status::Paused,
            UserAction::Resume => Status::InProgress,
            UserAction::Complete => Status::Completed,
            UserAction::Apply => Status::Applied,
        }
    }

    /// Whether the UI offers this action from `from`.
    pub fn is_offered_from(&self, from: Status) -> bool {
        use Status::*;
        match self {
            UserAction::Promote => from == Backlog,
            UserAction::Schedule => from == Draft,
            UserAction::Approve => matches!(from, UnderReview | NeedsRevision),
            UserAction::RequestRevision => from == UnderReview,
            UserAction::Resubmit => from == NeedsRevision,
            UserAction::Pause => from == InProgress,
            UserAction::Resume => from == Paused,
            UserAction::Complete => matches!(from, InProgress | Paused),
            UserAction::Apply => from == Documented,
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Actions the UI offers from `from`, in declaration order.
pub fn available_actions(from: Status) -> Vec<UserAction> {
    UserAction::ALL
        .into_iter()
        .filter(|action| action.is_offered_from(from))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_db_str(phase.as_db_str()).unwrap(), phase);
        }
        assert_eq!("Execution".parse::<Phase>().unwrap(), Phase::Execution);
        assert!(Phase::from_db_str("launch").is_err());
    }

    #[test]
    fn test_status_belongs_to_exactly_one_phase() {
        for status in Status::ALL {
            let owners: Vec<Phase> = Phase::ALL
                .into_iter()
                .filter(|p| p.statuses().contains(&status))
                .collect();
            assert_eq!(owners, vec![status.phase()]);
        }
    }

    #[test]
    fn test_order_is_monotonic_across_phases() {
        let orders: Vec<u8> = Status::ALL.iter().map(Status::order).collect();
        assert_eq!(orders, (1..=12).collect::<Vec<u8>>());
        for pair in Status::ALL.windows(2) {
            assert!(pair[0].phase() <= pair[1].phase());
        }
    }

    #[test]
    fn test_resolve_status_case_insensitive() {
        assert_eq!(resolve_status("under review"), Some(Status::UnderReview));
        assert_eq!(resolve_status("UNDER REVIEW"), Some(Status::UnderReview));
        assert_eq!(resolve_status("  In   Progress "), Some(Status::InProgress));
        assert_eq!(resolve_status("shipped"), None);
        assert_eq!(resolve_status(""), None);
    }

    #[test]
    fn test_resolve_status_roundtrips_labels() {
        for status in Status::ALL {
            assert_eq!(resolve_status(status.label()), Some(status));
            assert_eq!(resolve_status(status.as_db_str()), Some(status));
        }
    }

    #[test]
    fn test_status_serializes_as_db_str() {
        for status in Status::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::from(status.as_db_str()));
            assert_eq!(serde_json::from_value::<Status>(json).unwrap(), status);
        }
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in progress\"");
    }

    #[test]
    fn test_from_str_unresolved() {
        let err = "shipped".parse::<Status>().unwrap_err();
        assert!(matches!(err, LifecycleError::UnresolvedStatus { label } if label == "shipped"));
    }

    #[test]
    fn test_entry_statuses() {
        assert_eq!(Phase::Planning.entry_status(), None);
        assert_eq!(Phase::Review.entry_status(), Some(Status::UnderReview));
        assert_eq!(Phase::Execution.entry_status(), Some(Status::InProgress));
        assert_eq!(Phase::Knowledge.entry_status(), Some(Status::Documented));
    }

    #[test]
    fn test_available_actions() {
        assert_eq!(available_actions(Status::Backlog), vec![UserAction::Promote]);
        assert_eq!(
            available_actions(Status::UnderReview),
            vec![UserAction::Approve, UserAction::RequestRevision]
        );
        assert_eq!(
            available_actions(Status::InProgress),
            vec![UserAction::Pause, UserAction::Complete]
        );
        assert_eq!(
            available_actions(Status::Paused),
            vec![UserAction::Resume, UserAction::Complete]
        );
        assert!(available_actions(Status::Completed).is_empty());
        assert!(available_actions(Status::Applied).is_empty());
    }

    #[test]
    fn test_action_targets_stay_in_phase() {
        for action in UserAction::ALL {
            for from in Status::ALL {
                if action.is_offered_from(from) {
                    assert_eq!(action.target().phase(), from.phase());
                }
            }
        }
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<Status> = Status::ALL.into_iter().filter(Status::is_terminal).collect();
        assert_eq!(terminal, vec![Status::Completed, Status::Applied]);
    }
}
