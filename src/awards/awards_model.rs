use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered award classification of a subject's progress on a challenge.
///
/// The ordering is load-bearing: records only ever move up this ladder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AwardTier {
    #[default]
    None,
    Participation,
    Beaten,
    Mastery,
}

impl AwardTier {
    /// Shadow challenges cap at Beaten; applied by callers, never by the
    /// classifier itself.
    pub fn capped_for_shadow(self) -> Self {
        self.min(AwardTier::Beaten)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AwardTier::None => "none",
            AwardTier::Participation => "participation",
            AwardTier::Beaten => "beaten",
            AwardTier::Mastery => "mastery",
        }
    }
}

impl std::fmt::Display for AwardTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest tier reached and the earned count recorded alongside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardProgress {
    pub tier: AwardTier,
    pub achieved_count: usize,
}

/// Per-period award bookkeeping for one subject: the monthly challenge and
/// its shadow counterpart. Tiers never regress once recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub monthly: AwardProgress,
    pub shadow: AwardProgress,
}

impl AwardRecord {
    pub fn slot_mut(&mut self, shadow: bool) -> &mut AwardProgress {
        if shadow {
            &mut self.shadow
        } else {
            &mut self.monthly
        }
    }

    pub fn slot(&self, shadow: bool) -> &AwardProgress {
        if shadow {
            &self.shadow
        } else {
            &self.monthly
        }
    }
}

/// A tracked challenge: one game, one month window, one win condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeDefinition {
    pub challenge_id: String,
    /// External game id the progress endpoint is queried with.
    pub game_id: String,
    /// First day of the challenge month.
    pub month_start: NaiveDate,
    /// Achievement ids that must all be earned for mastery. May be empty,
    /// in which case mastery is unreachable.
    pub required_ids: HashSet<u64>,
    /// Total achievements the challenge defines, for progress rendering.
    pub total_required: usize,
    /// Earned count that qualifies as beating the challenge. May be smaller
    /// than the full requirement set.
    pub beaten_threshold: usize,
    /// Shadow challenges cap at Beaten.
    pub shadow: bool,
}
