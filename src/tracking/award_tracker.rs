//! Per-subject award tracking for monthly and shadow challenges.
//!
//! One call to [`AwardTracker::poll_challenge`] checks every roster member
//! against one challenge: window the earned set, classify it, and emit a
//! tier event only when the persisted record strictly increases. Failures
//! are isolated per subject.

use std::sync::Arc;

use log::{info, warn};

use crate::api::traits::AchievementSource;
use crate::awards::awards_model::ChallengeDefinition;
use crate::awards::classifier::{classify, earned_ids_in_window, period_key};
use crate::store::store_traits::SubjectProfileRepository;
use crate::tracking::tracking_model::{RosterMember, TransitionEvent};

pub struct AwardTracker<S: AchievementSource, P: SubjectProfileRepository> {
    source: Arc<S>,
    profiles: Arc<P>,
}

impl<S: AchievementSource, P: SubjectProfileRepository> AwardTracker<S, P> {
    pub fn new(source: Arc<S>, profiles: Arc<P>) -> Self {
        Self { source, profiles }
    }

    /// Run one award cycle for one challenge across the roster.
    pub async fn poll_challenge(
        &self,
        challenge: &ChallengeDefinition,
        roster: &[RosterMember],
    ) -> Vec<TransitionEvent> {
        let period = period_key(challenge.month_start);
        let mut events = Vec::new();

        for member in roster {
            match self.poll_subject(challenge, &period, member).await {
                Ok(mut subject_events) => events.append(&mut subject_events),
                Err(err) => warn!(
                    "challenge {}: skipping {} this cycle: {}",
                    challenge.challenge_id, member.subject_key, err
                ),
            }
        }
        events
    }

    async fn poll_subject(
        &self,
        challenge: &ChallengeDefinition,
        period: &str,
        member: &RosterMember,
    ) -> crate::Result<Vec<TransitionEvent>> {
        let progress = self
            .source
            .game_progress(&member.api_username, &challenge.game_id)
            .await?;
        let earned = earned_ids_in_window(&progress, challenge.month_start);

        let mut tier = classify(challenge, &earned);
        if challenge.shadow {
            tier = tier.capped_for_shadow();
        }

        let mut profile = self.profiles.load_or_default(&member.subject_key).await?;
        let mut events = Vec::new();

        let record = profile.award_records.entry(period.to_string()).or_default();
        let slot = record.slot_mut(challenge.shadow);
        let tier_increased = tier > slot.tier;
        if tier_increased {
            info!(
                "challenge {}: {} reached {} ({}/{})",
                challenge.challenge_id,
                member.subject_key,
                tier,
                earned.len(),
                challenge.total_required
            );
            slot.tier = tier;
            slot.achieved_count = earned.len();
            events.push(TransitionEvent::tier_increase(
                &challenge.challenge_id,
                &member.subject_key,
                tier,
                earned.len(),
                challenge.total_required,
            ));
        }

        // Fine-grained events for ids not yet announced. Read-only here:
        // the dispatcher owns the log and records ids at hand-off.
        let mut fresh_ids: Vec<u64> = earned
            .iter()
            .copied()
            .filter(|id| !profile.announced_log.contains(*id))
            .collect();
        fresh_ids.sort_unstable();
        for id in fresh_ids {
            events.push(TransitionEvent::achievement_earned(
                &challenge.challenge_id,
                &member.subject_key,
                id,
            ));
        }

        if tier_increased {
            self.profiles.save_profile(&profile).await?;
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::api::errors::ApiError;
    use crate::api::models::{GameProgress, RankedEntry};
    use crate::awards::awards_model::AwardTier;
    use crate::store::memory::MemoryStore;
    use crate::tracking::tracking_model::TransitionKind;

    /// Progress per (username, game); replaced between cycles by tests.
    struct FakeProgressSource {
        progress: Mutex<HashMap<String, GameProgress>>,
    }

    impl FakeProgressSource {
        fn new() -> Self {
            Self {
                progress: Mutex::new(HashMap::new()),
            }
        }

        fn set_progress(&self, username: &str, earned_ids: &[u64], earned_on: &str) {
            let earned_at = chrono::NaiveDateTime::parse_from_str(
                &format!("{} 12:00:00", earned_on),
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap()
            .and_utc();
            let progress = GameProgress {
                earned: earned_ids.iter().map(|id| (*id, earned_at)).collect(),
                total: 10,
            };
            self.progress
                .lock()
                .unwrap()
                .insert(username.to_string(), progress);
        }
    }

    #[async_trait]
    impl AchievementSource for FakeProgressSource {
        async fn leaderboard(&self, _board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
            Ok(Vec::new())
        }

        async fn leaderboard_fresh(&self, _board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
            Ok(Vec::new())
        }

        async fn game_progress(
            &self,
            username: &str,
            _game_id: &str,
        ) -> Result<GameProgress, ApiError> {
            Ok(self
                .progress
                .lock()
                .unwrap()
                .get(username)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn challenge(shadow: bool) -> ChallengeDefinition {
        ChallengeDefinition {
            challenge_id: "monthly-march".to_string(),
            game_id: "game-9".to_string(),
            month_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            required_ids: HashSet::from([1, 2, 3]),
            total_required: 3,
            beaten_threshold: 2,
            shadow,
        }
    }

    fn member(key: &str) -> RosterMember {
        RosterMember {
            subject_key: key.to_string(),
            api_username: key.to_string(),
            notify_target: None,
        }
    }

    fn tracker(
        source: Arc<FakeProgressSource>,
        store: Arc<MemoryStore>,
    ) -> AwardTracker<FakeProgressSource, MemoryStore> {
        AwardTracker::new(source, store)
    }

    #[tokio::test]
    async fn test_tier_increase_emits_once_and_persists() {
        let source = Arc::new(FakeProgressSource::new());
        let store = Arc::new(MemoryStore::new());
        source.set_progress("alice", &[1, 2, 3], "2024-03-10");

        let tracker = tracker(source.clone(), store.clone());
        let roster = vec![member("alice")];

        let events = tracker.poll_challenge(&challenge(false), &roster).await;
        let tiers: Vec<_> = events
            .iter()
            .filter(|e| e.kind == TransitionKind::TierIncreased)
            .collect();
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].tier, Some(AwardTier::Mastery));
        assert_eq!(tiers[0].achieved_count, Some(3));

        // Second cycle with identical progress: no further tier events.
        let events = tracker.poll_challenge(&challenge(false), &roster).await;
        assert!(events
            .iter()
            .all(|e| e.kind != TransitionKind::TierIncreased));

        let profile = store.load_profile("alice").await.unwrap().unwrap();
        assert_eq!(
            profile.award_records["2024-03"].monthly.tier,
            AwardTier::Mastery
        );
    }

    #[tokio::test]
    async fn test_tier_never_regresses_when_api_under_reports() {
        let source = Arc::new(FakeProgressSource::new());
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(source.clone(), store.clone());
        let roster = vec![member("alice")];

        source.set_progress("alice", &[1, 2], "2024-03-10");
        tracker.poll_challenge(&challenge(false), &roster).await;

        // Transient glitch: the API reports a single achievement.
        source.set_progress("alice", &[1], "2024-03-10");
        let events = tracker.poll_challenge(&challenge(false), &roster).await;

        assert!(events
            .iter()
            .all(|e| e.kind != TransitionKind::TierIncreased));
        let profile = store.load_profile("alice").await.unwrap().unwrap();
        let slot = &profile.award_records["2024-03"].monthly;
        assert_eq!(slot.tier, AwardTier::Beaten);
        assert_eq!(slot.achieved_count, 2);
    }

    #[tokio::test]
    async fn test_shadow_challenge_caps_at_beaten() {
        let source = Arc::new(FakeProgressSource::new());
        let store = Arc::new(MemoryStore::new());
        source.set_progress("alice", &[1, 2, 3], "2024-03-10");

        let tracker = tracker(source, store.clone());
        let events = tracker
            .poll_challenge(&challenge(true), &[member("alice")])
            .await;

        let tiers: Vec<_> = events
            .iter()
            .filter(|e| e.kind == TransitionKind::TierIncreased)
            .collect();
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].tier, Some(AwardTier::Beaten));

        let profile = store.load_profile("alice").await.unwrap().unwrap();
        assert_eq!(
            profile.award_records["2024-03"].shadow.tier,
            AwardTier::Beaten
        );
        assert_eq!(profile.award_records["2024-03"].monthly.tier, AwardTier::None);
    }

    #[tokio::test]
    async fn test_out_of_window_progress_is_ignored() {
        let source = Arc::new(FakeProgressSource::new());
        let store = Arc::new(MemoryStore::new());
        source.set_progress("alice", &[1, 2, 3], "2024-01-15");

        let tracker = tracker(source, store.clone());
        let events = tracker
            .poll_challenge(&challenge(false), &[member("alice")])
            .await;

        assert!(events.is_empty());
        assert_eq!(store.profile_count().await, 0);
    }

    #[tokio::test]
    async fn test_achievement_events_skip_already_announced_ids() {
        let source = Arc::new(FakeProgressSource::new());
        let store = Arc::new(MemoryStore::new());
        source.set_progress("alice", &[1, 2], "2024-03-10");

        let mut profile = crate::store::SubjectProfile::new("alice");
        profile.announced_log.record(1, 200);
        store.save_profile(&profile).await.unwrap();

        let tracker = tracker(source, store);
        let events = tracker
            .poll_challenge(&challenge(false), &[member("alice")])
            .await;

        let earned: Vec<_> = events
            .iter()
            .filter(|e| e.kind == TransitionKind::AchievementEarned)
            .collect();
        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].achievement_id, Some(2));
    }

    #[tokio::test]
    async fn test_subject_failures_are_isolated() {
        struct FailingSource;

        #[async_trait]
        impl AchievementSource for FailingSource {
            async fn leaderboard(&self, _: &str) -> Result<Vec<RankedEntry>, ApiError> {
                Ok(Vec::new())
            }
            async fn leaderboard_fresh(&self, _: &str) -> Result<Vec<RankedEntry>, ApiError> {
                Ok(Vec::new())
            }
            async fn game_progress(
                &self,
                username: &str,
                _: &str,
            ) -> Result<GameProgress, ApiError> {
                if username == "alice" {
                    Err(ApiError::NotFound("alice".to_string()))
                } else {
                    let earned_at = chrono::NaiveDateTime::parse_from_str(
                        "2024-03-10 12:00:00",
                        "%Y-%m-%d %H:%M:%S",
                    )
                    .unwrap()
                    .and_utc();
                    Ok(GameProgress {
                        earned: HashMap::from([(1, earned_at)]),
                        total: 10,
                    })
                }
            }
        }

        let store = Arc::new(MemoryStore::new());
        let tracker = AwardTracker::new(Arc::new(FailingSource), store);
        let events = tracker
            .poll_challenge(&challenge(false), &[member("alice"), member("bob")])
            .await;

        // Alice's failure does not stop Bob's tier event.
        assert!(events
            .iter()
            .any(|e| e.subject_key == "bob" && e.kind == TransitionKind::TierIncreased));
        assert!(events.iter().all(|e| e.subject_key != "alice"));
    }
}
