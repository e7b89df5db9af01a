//! In-memory experiment store.
//!
//! Records live in a `HashMap` behind an `RwLock`. Every mutation takes the
//! write lock for its whole read-modify-write, so two transitions racing on
//! the same record never lose an update.

use crate::{
    handoff, EntityId, ExperimentRecord, LabbookError, LabbookResult, Phase, Status, StatusChange,
    StoreError, UserAction,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, cloneable handle to an in-memory collection of records.
///
/// # Example
///
/// ```rust
/// use labbook_core::{ExperimentRecord, ExperimentStore, Status, UserAction};
///
/// let store = ExperimentStore::new();
/// let id = store.insert(ExperimentRecord::new_idea("Checkout copy")).unwrap();
/// store.apply_action(id, UserAction::Promote).unwrap();
/// assert_eq!(store.get(id).unwrap().resolved_status(), Some(Status::Draft));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExperimentStore {
    records: Arc<RwLock<HashMap<EntityId, ExperimentRecord>>>,
}

impl ExperimentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LabbookResult<RwLockReadGuard<'_, HashMap<EntityId, ExperimentRecord>>> {
        self.records
            .read()
            .map_err(|_| LabbookError::Store(StoreError::LockPoisoned))
    }

    fn write(&self) -> LabbookResult<RwLockWriteGuard<'_, HashMap<EntityId, ExperimentRecord>>> {
        self.records
            .write()
            .map_err(|_| LabbookError::Store(StoreError::LockPoisoned))
    }

    /// Number of records in the store.
    pub fn len(&self) -> LabbookResult<usize> {
        Ok(self.read()?.len())
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> LabbookResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Add a record. Ids must be unique.
    pub fn insert(&self, record: ExperimentRecord) -> LabbookResult<EntityId> {
        let mut records = self.write()?;
        let id = record.id;
        if records.contains_key(&id) {
            return Err(StoreError::AlreadyExists { id }.into());
        }
        records.insert(id, record);
        tracing::debug!(id = %id, "record inserted");
        Ok(id)
    }

    /// Snapshot of a single record.
    pub fn get(&self, id: EntityId) -> LabbookResult<ExperimentRecord> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id }.into())
    }

    /// Remove a record from the collection (UI-level delete).
    pub fn remove(&self, id: EntityId) -> LabbookResult<ExperimentRecord> {
        let removed = self
            .write()?
            .remove(&id)
            .ok_or(LabbookError::Store(StoreError::NotFound { id }))?;
        tracing::debug!(id = %id, "record removed");
        Ok(removed)
    }

    /// All records, sorted by status order then creation time.
    pub fn list(&self) -> LabbookResult<Vec<ExperimentRecord>> {
        let mut records: Vec<ExperimentRecord> = self.read()?.values().cloned().collect();
        records.sort_by_key(|r| {
            (
                r.resolved_status().map(|s| s.order()).unwrap_or(u8::MAX),
                r.created_at,
                r.id,
            )
        });
        Ok(records)
    }

    /// Records currently in `phase`.
    pub fn list_by_phase(&self, phase: Phase) -> LabbookResult<Vec<ExperimentRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| r.phase == phase)
            .collect())
    }

    /// Count of records per stored status label.
    ///
    /// Unresolved labels are counted under their raw text so the UI can still
    /// show a generic badge for them.
    pub fn status_counts(&self) -> LabbookResult<BTreeMap<String, usize>> {
        let records = self.read()?;
        let mut counts = BTreeMap::new();
        for record in records.values() {
            let key = record
                .resolved_status()
                .map(|s| s.as_db_str().to_string())
                .unwrap_or_else(|| record.status.clone());
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Atomically set the status of a record.
    pub fn transition(&self, id: EntityId, status: Status) -> LabbookResult<StatusChange> {
        let mut records = self.write()?;
        let record = records
            .get_mut(&id)
            .ok_or(LabbookError::Store(StoreError::NotFound { id }))?;
        Ok(record.transition(status))
    }

    /// Atomically apply a UI action to a record.
    pub fn apply_action(&self, id: EntityId, action: UserAction) -> LabbookResult<StatusChange> {
        let mut records = self.write()?;
        let record = records
            .get_mut(&id)
            .ok_or(LabbookError::Store(StoreError::NotFound { id }))?;
        record.apply_action(action)
    }

    /// Spawn a successor of `source_id` into `target` and store it.
    ///
    /// The source annotation and the insert happen under one lock, and the
    /// new id is checked against every stored id.
    pub fn spawn_successor(
        &self,
        source_id: EntityId,
        target: Phase,
    ) -> LabbookResult<ExperimentRecord> {
        let mut records = self.write()?;
        let mut source = records
            .get(&source_id)
            .cloned()
            .ok_or(LabbookError::Store(StoreError::NotFound { id: source_id }))?;

        let successor =
            handoff::spawn_successor_with(&mut source, target, |id| records.contains_key(id))?;

        records.insert(source_id, source);
        records.insert(successor.id, successor.clone());
        Ok(successor)
    }
}
