//! Pure classification of an earned-achievement set against a challenge.
//!
//! `classify` is context-free: it knows nothing about shadow caps, persisted
//! records, or where the earned set came from. Windowing is the caller's
//! job, via `earned_ids_in_window`.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::api::models::GameProgress;
use crate::awards::awards_model::{AwardTier, ChallengeDefinition};

/// Classify an in-window earned set into an award tier.
///
/// Rules, in priority order:
/// 1. non-empty required set fully earned: Mastery
/// 2. earned count at or above the beaten threshold: Beaten
/// 3. anything earned: Participation
/// 4. otherwise: None
pub fn classify(challenge: &ChallengeDefinition, earned_in_window: &HashSet<u64>) -> AwardTier {
    if !challenge.required_ids.is_empty() && challenge.required_ids.is_subset(earned_in_window) {
        return AwardTier::Mastery;
    }
    // A zero threshold disables the win condition.
    if challenge.beaten_threshold > 0 && earned_in_window.len() >= challenge.beaten_threshold {
        return AwardTier::Beaten;
    }
    if !earned_in_window.is_empty() {
        return AwardTier::Participation;
    }
    AwardTier::None
}

/// Whether an earned timestamp counts toward the challenge month.
///
/// Counts when the earned date falls within `[month_start, next_month_start)`
/// or on the single calendar day immediately preceding `month_start`. The
/// grace day absorbs timezone and clock skew between this process and the
/// upstream service.
pub fn in_challenge_window(earned_at: DateTime<Utc>, month_start: NaiveDate) -> bool {
    let month_start = first_of_month(month_start);
    let date = earned_at.date_naive();
    let grace_start = month_start.pred_opt().unwrap_or(month_start);
    let next_start = month_start
        .checked_add_months(Months::new(1))
        .unwrap_or(month_start);
    date >= grace_start && date < next_start
}

/// The earned ids from a progress record that fall inside the challenge
/// window.
pub fn earned_ids_in_window(progress: &GameProgress, month_start: NaiveDate) -> HashSet<u64> {
    progress
        .earned
        .iter()
        .filter(|(_, earned_at)| in_challenge_window(**earned_at, month_start))
        .map(|(id, _)| *id)
        .collect()
}

/// Stable key for one challenge month, e.g. `2024-03`.
pub fn period_key(month_start: NaiveDate) -> String {
    format!("{:04}-{:02}", month_start.year(), month_start.month())
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
