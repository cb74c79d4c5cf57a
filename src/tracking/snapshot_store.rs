use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::tracking::tracking_model::EntitySnapshot;

/// In-process baseline snapshots, one per tracked entity.
///
/// Only the diff engine replaces entries, and each replacement is wholesale,
/// so a reader never observes a partially updated snapshot. Snapshots are
/// not persisted: after a restart the first cycle rebuilds baselines without
/// emitting events.
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<String, EntitySnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, entity_id: &str) -> Option<EntitySnapshot> {
        self.snapshots.read().await.get(entity_id).cloned()
    }

    /// Install a new baseline, returning the previous one.
    pub async fn replace(&self, snapshot: EntitySnapshot) -> Option<EntitySnapshot> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.entity_id.clone(), snapshot)
    }

    pub async fn remove(&self, entity_id: &str) -> Option<EntitySnapshot> {
        self.snapshots.write().await.remove(entity_id)
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
