//! Hand-off of a record into the next lifecycle phase.
//!
//! ```text
//! Planned ──spawn(Review)──→ brief (Under Review)      source.brief_id
//! Approved ─spawn(Execution)→ experiment (In Progress)  source.experiment_id
//! Completed ─spawn(Knowledge)→ knowledge (Documented)   source.knowledge_id
//! ```
//!
//! The source keeps its own status. Only the matching back-reference is
//! written, and never over an existing one.

use crate::{
    fresh_entity_id, EntityId, ExperimentRecord, LabbookResult, LifecycleError, Phase,
    SuccessorLinks,
};
use chrono::Utc;

/// Check whether `source` may hand off into `target` without mutating it.
pub fn check_handoff(source: &ExperimentRecord, target: Phase) -> LabbookResult<()> {
    let (Some(_), Some(required)) = (target.entry_status(), target.handoff_source_status()) else {
        return Err(LifecycleError::NoEntryStatus { phase: target }.into());
    };

    if let Some(successor_id) = source.links.get(target) {
        return Err(LifecycleError::SuccessorAlreadyLinked {
            source_id: source.id,
            target,
            successor_id,
        }
        .into());
    }

    if source.resolved_status() != Some(required) {
        return Err(LifecycleError::HandoffNotReady {
            source_id: source.id,
            status: source.status.clone(),
            target,
        }
        .into());
    }

    Ok(())
}

/// Spawn a successor of `source` in `target`.
///
/// `taken` reports ids already in use so the new id is unique within the
/// caller's collection.
pub fn spawn_successor_with<F>(
    source: &mut ExperimentRecord,
    target: Phase,
    taken: F,
) -> LabbookResult<ExperimentRecord>
where
    F: Fn(&EntityId) -> bool,
{
    check_handoff(source, target)?;
    let entry = target
        .entry_status()
        .ok_or(LifecycleError::NoEntryStatus { phase: target })?;

    let source_id = source.id;
    let id = fresh_entity_id(|candidate| *candidate == source_id || taken(candidate));
    let now = Utc::now();
    let successor = ExperimentRecord {
        id,
        name: source.name.clone(),
        status: entry.as_db_str().to_string(),
        phase: target,
        goal: source.goal.clone(),
        hypothesis: source.hypothesis.clone(),
        metric: source.metric.clone(),
        owner: source.owner.clone(),
        source_id: Some(source_id),
        links: SuccessorLinks::default(),
        results: if target == Phase::Knowledge {
            source.results
        } else {
            None
        },
        insights: Vec::new(),
        created_at: now,
        updated_at: now,
        metadata: None,
    };

    source.links.set(target, id);
    source.updated_at = now;

    tracing::debug!(
        source_id = %source_id,
        successor_id = %id,
        phase = %target,
        status = %entry.as_db_str(),
        "spawned successor"
    );

    Ok(successor)
}

/// Spawn a successor of `source` in `target` with a fresh id.
pub fn spawn_successor(
    source: &mut ExperimentRecord,
    target: Phase,
) -> LabbookResult<ExperimentRecord> {
    spawn_successor_with(source, target, |_| false)
}
