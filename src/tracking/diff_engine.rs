//! Per-entity snapshot diffing.
//!
//! One call to [`DiffEngine::poll_entity`] is one cycle for one tracked
//! leaderboard: fetch, gate, diff, replace baseline. Failures degrade to an
//! empty event list so no entity can stall the cycle for the others.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::api::traits::AchievementSource;
use crate::settings::TrackerSettings;
use crate::tracking::snapshot_store::SnapshotStore;
use crate::tracking::tracking_model::{
    EntitySnapshot, SnapshotEntry, TrackedEntity, TransitionEvent, TransitionKind,
};

pub struct DiffEngine<S: AchievementSource> {
    source: Arc<S>,
    snapshots: Arc<SnapshotStore>,
    settings: TrackerSettings,
    /// Per-entity count of fetches rejected by the consistency gate.
    inconsistency_counts: Mutex<HashMap<String, u64>>,
}

impl<S: AchievementSource> DiffEngine<S> {
    pub fn new(source: Arc<S>, snapshots: Arc<SnapshotStore>, settings: TrackerSettings) -> Self {
        Self {
            source,
            snapshots,
            settings,
            inconsistency_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Run one poll cycle for one entity. `roster` maps lowercased external
    /// user names to subject keys; subjects outside it never produce events.
    pub async fn poll_entity(
        &self,
        entity: &TrackedEntity,
        roster: &HashMap<String, String>,
    ) -> Vec<TransitionEvent> {
        let listing = match self.source.leaderboard(&entity.board_id).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    "entity {}: leaderboard fetch failed, skipping this cycle: {}",
                    entity.entity_id, err
                );
                return Vec::new();
            }
        };

        let mut current = EntitySnapshot::from_listing(&entity.entity_id, &listing, roster);
        if entity.reconfirm {
            current = self.reconfirm(entity, roster, current).await;
        }

        // The fresh snapshot becomes the baseline no matter what happens
        // below; a single bad read must not wedge future comparisons.
        let previous = self.snapshots.replace(current.clone()).await;

        let Some(previous) = previous else {
            info!(
                "entity {}: established baseline with {} tracked subjects",
                entity.entity_id,
                current.len()
            );
            return Vec::new();
        };

        if !self.sizes_consistent(previous.len(), current.len()) {
            let total = self.bump_inconsistency(&entity.entity_id);
            warn!(
                "entity {}: snapshot size moved {} -> {}, treating fetch as unreliable \
                 (occurrence {}); diff skipped",
                entity.entity_id,
                previous.len(),
                current.len(),
                total
            );
            return Vec::new();
        }

        self.diff(&previous, &current)
    }

    /// How often the consistency gate has rejected a fetch for an entity.
    pub fn inconsistency_count(&self, entity_id: &str) -> u64 {
        self.lock_counts().get(entity_id).copied().unwrap_or(0)
    }

    fn bump_inconsistency(&self, entity_id: &str) -> u64 {
        let mut counts = self.lock_counts();
        let count = counts.entry(entity_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn lock_counts(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.inconsistency_counts.lock().unwrap_or_else(|poisoned| {
            warn!("inconsistency counter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Accept a size change when it stays within the absolute slack or the
    /// relative tolerance of the previous size.
    fn sizes_consistent(&self, previous: usize, current: usize) -> bool {
        let delta = previous.abs_diff(current);
        if delta <= self.settings.consistency_min_slack {
            return true;
        }
        (delta as f64) <= self.settings.consistency_tolerance * (previous.max(1) as f64)
    }

    /// Fetch a second, uncached listing and require the two to agree before
    /// trusting either. On disagreement the larger (more complete) fetch
    /// wins.
    async fn reconfirm(
        &self,
        entity: &TrackedEntity,
        roster: &HashMap<String, String>,
        first: EntitySnapshot,
    ) -> EntitySnapshot {
        tokio::time::sleep(self.settings.reconfirm_delay()).await;

        let second = match self.source.leaderboard_fresh(&entity.board_id).await {
            Ok(rows) => EntitySnapshot::from_listing(&entity.entity_id, &rows, roster),
            Err(err) => {
                warn!(
                    "entity {}: re-confirmation fetch failed, keeping first read: {}",
                    entity.entity_id, err
                );
                return first;
            }
        };

        let overlap = first.overlap_fraction(&second);
        let delta = first.len().abs_diff(second.len());
        if overlap >= self.settings.reconfirm_overlap && delta <= 1 {
            return first;
        }

        warn!(
            "entity {}: fetches disagree (overlap {:.0}%, sizes {} vs {}), preferring larger",
            entity.entity_id,
            overlap * 100.0,
            first.len(),
            second.len()
        );
        if second.len() > first.len() {
            second
        } else {
            first
        }
    }

    fn diff(&self, previous: &EntitySnapshot, current: &EntitySnapshot) -> Vec<TransitionEvent> {
        let k = self.settings.top_k;
        let mut events = Vec::new();

        let mut current_ordered: Vec<(&String, &SnapshotEntry)> = current.entries.iter().collect();
        current_ordered.sort_by(|a, b| a.1.community_rank.cmp(&b.1.community_rank));

        for (subject, entry) in current_ordered {
            if entry.community_rank > k {
                continue;
            }
            match previous.entries.get(subject) {
                None => events.push(TransitionEvent::rank_change(
                    TransitionKind::EnteredTopK,
                    &current.entity_id,
                    subject,
                    None,
                    Some(entry.community_rank),
                )),
                Some(prev) if prev.community_rank > k => events.push(TransitionEvent::rank_change(
                    TransitionKind::RankImproved,
                    &current.entity_id,
                    subject,
                    Some(prev.community_rank),
                    Some(entry.community_rank),
                )),
                Some(prev) if prev.community_rank > entry.community_rank => {
                    events.push(TransitionEvent::rank_change(
                        TransitionKind::RankImproved,
                        &current.entity_id,
                        subject,
                        Some(prev.community_rank),
                        Some(entry.community_rank),
                    ))
                }
                Some(prev) if prev.community_rank < entry.community_rank => {
                    events.push(TransitionEvent::rank_change(
                        TransitionKind::RankDecreased,
                        &current.entity_id,
                        subject,
                        Some(prev.community_rank),
                        Some(entry.community_rank),
                    ))
                }
                Some(_) => {}
            }
        }

        let mut previous_ordered: Vec<(&String, &SnapshotEntry)> =
            previous.entries.iter().collect();
        previous_ordered.sort_by(|a, b| a.1.community_rank.cmp(&b.1.community_rank));

        for (subject, prev) in previous_ordered {
            if prev.community_rank > k {
                continue;
            }
            let fell_out = match current.entries.get(subject) {
                None => true,
                Some(entry) => entry.community_rank > k,
            };
            if fell_out {
                events.push(TransitionEvent::rank_change(
                    TransitionKind::FellOutOfTopK,
                    &current.entity_id,
                    subject,
                    Some(prev.community_rank),
                    current.entries.get(subject).map(|e| e.community_rank),
                ));
            }
        }

        events
    }
}
