//! Identity types for LABBOOK entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, so records sort by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Generate an id that does not collide with any id in `taken`.
///
/// UUIDv7 collisions are practically impossible, but records can be imported
/// with arbitrary ids, so spawning re-checks against the live collection.
pub fn fresh_entity_id<F>(taken: F) -> EntityId
where
    F: Fn(&EntityId) -> bool,
{
    loop {
        let id = new_entity_id();
        if !taken(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_entity_id_is_v7() {
        let id = new_entity_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_entity_ids_are_sortable() {
        let id1 = new_entity_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = new_entity_id();
        assert!(id1.to_string() < id2.to_string());
    }

    #[test]
    fn test_fresh_entity_id_avoids_taken() {
        let taken: HashSet<EntityId> = (0..16).map(|_| new_entity_id()).collect();
        let id = fresh_entity_id(|candidate| taken.contains(candidate));
        assert!(!taken.contains(&id));
    }
}
