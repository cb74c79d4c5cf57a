use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::models::RankedEntry;
use crate::awards::awards_model::AwardTier;

/// A leaderboard the tracker polls and diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub entity_id: String,
    /// External board id the listing endpoint is queried with.
    pub board_id: String,
    /// Volatile entities get a second confirming fetch before their
    /// snapshot is trusted.
    #[serde(default)]
    pub reconfirm: bool,
}

/// One tracked community member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMember {
    pub subject_key: String,
    /// User name on the external service.
    pub api_username: String,
    /// Optional per-subject notification target.
    #[serde(default)]
    pub notify_target: Option<String>,
}

/// One subject's standing within an entity snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Rank among tracked subjects only, 1-based.
    pub community_rank: u32,
    /// Rank on the full upstream leaderboard.
    pub api_rank: u32,
    pub score_text: String,
}

/// Full view of an entity's tracked subjects at one point in time.
/// Replaced wholesale each poll cycle, never patched.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub entity_id: String,
    pub as_of: DateTime<Utc>,
    /// Subject key to standing.
    pub entries: HashMap<String, SnapshotEntry>,
}

impl EntitySnapshot {
    /// Build a snapshot from an API listing, keeping only tracked subjects.
    ///
    /// `roster` maps lowercased external user names to subject keys; rows
    /// for unknown users are discarded before any comparison happens.
    /// Community ranks are reassigned 1..n over the kept rows in API-rank
    /// order.
    pub fn from_listing(
        entity_id: &str,
        listing: &[RankedEntry],
        roster: &HashMap<String, String>,
    ) -> Self {
        let mut kept: Vec<(&str, &RankedEntry)> = listing
            .iter()
            .filter_map(|row| {
                roster
                    .get(&row.subject.to_lowercase())
                    .map(|subject_key| (subject_key.as_str(), row))
            })
            .collect();
        kept.sort_by(|a, b| a.1.api_rank.cmp(&b.1.api_rank).then(a.0.cmp(b.0)));

        let entries = kept
            .into_iter()
            .enumerate()
            .map(|(index, (subject_key, row))| {
                (
                    subject_key.to_string(),
                    SnapshotEntry {
                        community_rank: index as u32 + 1,
                        api_rank: row.api_rank,
                        score_text: row.score_text.clone(),
                    },
                )
            })
            .collect();

        Self {
            entity_id: entity_id.to_string(),
            as_of: Utc::now(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fraction of subjects shared with `other`, relative to the larger
    /// snapshot. Two empty snapshots trivially agree.
    pub fn overlap_fraction(&self, other: &EntitySnapshot) -> f64 {
        let larger = self.len().max(other.len());
        if larger == 0 {
            return 1.0;
        }
        let shared = self
            .entries
            .keys()
            .filter(|key| other.entries.contains_key(*key))
            .count();
        shared as f64 / larger as f64
    }
}

/// Detected, notable change between two snapshots or award states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    EnteredTopK,
    RankImproved,
    RankDecreased,
    FellOutOfTopK,
    TierIncreased,
    AchievementEarned,
}

/// Ephemeral transition event, consumed once by the dispatcher.
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub event_id: Uuid,
    pub kind: TransitionKind,
    pub subject_key: String,
    pub entity_id: String,
    pub previous_rank: Option<u32>,
    pub new_rank: Option<u32>,
    pub tier: Option<AwardTier>,
    pub achieved_count: Option<usize>,
    pub total_required: Option<usize>,
    pub achievement_id: Option<u64>,
    pub observed_at: DateTime<Utc>,
}

impl TransitionEvent {
    fn base(kind: TransitionKind, entity_id: &str, subject_key: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            subject_key: subject_key.to_string(),
            entity_id: entity_id.to_string(),
            previous_rank: None,
            new_rank: None,
            tier: None,
            achieved_count: None,
            total_required: None,
            achievement_id: None,
            observed_at: Utc::now(),
        }
    }

    pub fn rank_change(
        kind: TransitionKind,
        entity_id: &str,
        subject_key: &str,
        previous_rank: Option<u32>,
        new_rank: Option<u32>,
    ) -> Self {
        Self {
            previous_rank,
            new_rank,
            ..Self::base(kind, entity_id, subject_key)
        }
    }

    pub fn tier_increase(
        entity_id: &str,
        subject_key: &str,
        tier: AwardTier,
        achieved_count: usize,
        total_required: usize,
    ) -> Self {
        Self {
            tier: Some(tier),
            achieved_count: Some(achieved_count),
            total_required: Some(total_required),
            ..Self::base(TransitionKind::TierIncreased, entity_id, subject_key)
        }
    }

    pub fn achievement_earned(entity_id: &str, subject_key: &str, achievement_id: u64) -> Self {
        Self {
            achievement_id: Some(achievement_id),
            ..Self::base(TransitionKind::AchievementEarned, entity_id, subject_key)
        }
    }

    /// Copy with an explicit observation time; cycle code stamps events so
    /// throttling decisions are deterministic.
    pub fn observed(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }
}
