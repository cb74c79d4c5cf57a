//! Concrete poll cycles: rank diffing and award tracking.
//!
//! Both walk their configured work in stable id order, insert a fixed delay
//! between units to stay under the upstream's aggregate rate ceiling, and
//! dispatch whatever events come back. Configuration failures end the cycle
//! early; per-unit failures are already degraded inside the engine/tracker.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::error;

use crate::api::traits::AchievementSource;
use crate::notify::dispatcher::NotificationDispatcher;
use crate::notify::notify_traits::NotificationSink;
use crate::scheduler::poll_scheduler::PollCycle;
use crate::settings::TrackerSettings;
use crate::store::store_traits::{SubjectProfileRepository, TrackingConfigRepository};
use crate::tracking::award_tracker::AwardTracker;
use crate::tracking::diff_engine::DiffEngine;
use crate::tracking::tracking_model::RosterMember;

fn roster_map(roster: &[RosterMember]) -> HashMap<String, String> {
    roster
        .iter()
        .map(|member| (member.api_username.to_lowercase(), member.subject_key.clone()))
        .collect()
}

/// Periodic rank diffing across all tracked entities.
pub struct RankPollCycle<S, C, K, P>
where
    S: AchievementSource,
    C: TrackingConfigRepository,
    K: NotificationSink,
    P: SubjectProfileRepository,
{
    engine: Arc<DiffEngine<S>>,
    dispatcher: Arc<NotificationDispatcher<K, P>>,
    config: Arc<C>,
    settings: TrackerSettings,
}

impl<S, C, K, P> RankPollCycle<S, C, K, P>
where
    S: AchievementSource,
    C: TrackingConfigRepository,
    K: NotificationSink,
    P: SubjectProfileRepository,
{
    pub fn new(
        engine: Arc<DiffEngine<S>>,
        dispatcher: Arc<NotificationDispatcher<K, P>>,
        config: Arc<C>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            engine,
            dispatcher,
            config,
            settings,
        }
    }
}

#[async_trait]
impl<S, C, K, P> PollCycle for RankPollCycle<S, C, K, P>
where
    S: AchievementSource + 'static,
    C: TrackingConfigRepository + 'static,
    K: NotificationSink + 'static,
    P: SubjectProfileRepository + 'static,
{
    async fn run_cycle(&self) {
        let mut entities = match self.config.tracked_entities().await {
            Ok(entities) => entities,
            Err(err) => {
                error!("could not load tracked entities, skipping cycle: {}", err);
                return;
            }
        };
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

        let roster = match self.config.roster().await {
            Ok(roster) => roster,
            Err(err) => {
                error!("could not load roster, skipping cycle: {}", err);
                return;
            }
        };
        let roster = roster_map(&roster);

        for (index, entity) in entities.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.inter_entity_delay()).await;
            }
            let events = self.engine.poll_entity(entity, &roster).await;
            for event in &events {
                self.dispatcher.dispatch(event).await;
            }
        }
    }
}

/// Periodic award tracking across all tracked challenges.
pub struct AwardPollCycle<S, C, K, P>
where
    S: AchievementSource,
    C: TrackingConfigRepository,
    K: NotificationSink,
    P: SubjectProfileRepository,
{
    tracker: Arc<AwardTracker<S, P>>,
    dispatcher: Arc<NotificationDispatcher<K, P>>,
    config: Arc<C>,
    settings: TrackerSettings,
}

impl<S, C, K, P> AwardPollCycle<S, C, K, P>
where
    S: AchievementSource,
    C: TrackingConfigRepository,
    K: NotificationSink,
    P: SubjectProfileRepository,
{
    pub fn new(
        tracker: Arc<AwardTracker<S, P>>,
        dispatcher: Arc<NotificationDispatcher<K, P>>,
        config: Arc<C>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            tracker,
            dispatcher,
            config,
            settings,
        }
    }
}

#[async_trait]
impl<S, C, K, P> PollCycle for AwardPollCycle<S, C, K, P>
where
    S: AchievementSource + 'static,
    C: TrackingConfigRepository + 'static,
    K: NotificationSink + 'static,
    P: SubjectProfileRepository + 'static,
{
    async fn run_cycle(&self) {
        let mut challenges = match self.config.tracked_challenges().await {
            Ok(challenges) => challenges,
            Err(err) => {
                error!("could not load tracked challenges, skipping cycle: {}", err);
                return;
            }
        };
        challenges.sort_by(|a, b| a.challenge_id.cmp(&b.challenge_id));

        let roster = match self.config.roster().await {
            Ok(roster) => roster,
            Err(err) => {
                error!("could not load roster, skipping cycle: {}", err);
                return;
            }
        };

        for (index, challenge) in challenges.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.inter_entity_delay()).await;
            }
            let events = self.tracker.poll_challenge(challenge, &roster).await;
            for event in &events {
                self.dispatcher.dispatch(event).await;
            }
        }
    }
}
