//! Event dispatch: routing, throttling, duplicate suppression, hand-off.
//!
//! An event counts as sent the moment it is handed to the sink; sink
//! failures are logged and never roll back throttle or suppression state,
//! so retried deliveries cannot flood a destination with duplicates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::notify::notify_model::{render, RouteTable};
use crate::notify::notify_traits::NotificationSink;
use crate::settings::TrackerSettings;
use crate::store::store_traits::SubjectProfileRepository;
use crate::tracking::tracking_model::{TransitionEvent, TransitionKind};

pub struct NotificationDispatcher<K: NotificationSink, P: SubjectProfileRepository> {
    sink: Arc<K>,
    profiles: Arc<P>,
    routes: RouteTable,
    settings: TrackerSettings,
    /// Entity id to the observed time of the last dispatched notification.
    last_alert: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl<K: NotificationSink, P: SubjectProfileRepository> NotificationDispatcher<K, P> {
    pub fn new(
        sink: Arc<K>,
        profiles: Arc<P>,
        routes: RouteTable,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            sink,
            profiles,
            routes,
            settings,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatch one transition event. Never fails the caller: every drop
    /// reason ends at a log line.
    pub async fn dispatch(&self, event: &TransitionEvent) {
        let destinations = self.routes.destinations(event.kind);
        if destinations.is_empty() {
            error!(
                "no destination routed for {:?}; dropping event for {}",
                event.kind, event.subject_key
            );
            return;
        }

        if event.kind == TransitionKind::AchievementEarned && self.already_announced(event).await {
            debug!(
                "achievement {:?} for {} already announced, dropping",
                event.achievement_id, event.subject_key
            );
            return;
        }

        if !self.claim_alert_slot(&event.entity_id, event.observed_at) {
            info!(
                "entity {}: notification throttled, dropping {:?} for {}",
                event.entity_id, event.kind, event.subject_key
            );
            return;
        }

        // Past this point the event counts as sent: record the id before
        // the hand-off so a sink failure cannot cause a duplicate later.
        if event.kind == TransitionKind::AchievementEarned {
            self.record_announced(event).await;
        }

        let payload = render(event);
        for destination in destinations {
            if let Err(err) = self.sink.deliver(destination, &payload).await {
                warn!(
                    "delivery to {} failed for {}: {}",
                    destination, event.subject_key, err
                );
            }
        }
    }

    /// Reserve the entity's alert slot. The slot is claimed before any
    /// delivery happens so concurrent events cannot both pass the check.
    fn claim_alert_slot(&self, entity_id: &str, observed_at: DateTime<Utc>) -> bool {
        let min_interval = self.settings.min_alert_interval();
        let mut last_alert = self.lock_last_alert();
        if let Some(last) = last_alert.get(entity_id) {
            if observed_at.signed_duration_since(*last) < min_interval {
                return false;
            }
        }
        last_alert.insert(entity_id.to_string(), observed_at);
        true
    }

    fn lock_last_alert(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.last_alert.lock().unwrap_or_else(|poisoned| {
            warn!("alert throttle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether the event's achievement id was announced before. Repository
    /// failures fail open: better a rare duplicate than a silently lost
    /// notification.
    async fn already_announced(&self, event: &TransitionEvent) -> bool {
        let Some(achievement_id) = event.achievement_id else {
            return false;
        };
        match self.profiles.load_profile(&event.subject_key).await {
            Ok(Some(profile)) => profile.announced_log.contains(achievement_id),
            Ok(None) => false,
            Err(err) => {
                warn!(
                    "announced log unavailable for {}: {}; delivering anyway",
                    event.subject_key, err
                );
                false
            }
        }
    }

    /// Record the achievement id in the subject's announced log.
    async fn record_announced(&self, event: &TransitionEvent) {
        let Some(achievement_id) = event.achievement_id else {
            return;
        };
        let mut profile = match self.profiles.load_or_default(&event.subject_key).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(
                    "announced log unavailable for {}: {}",
                    event.subject_key, err
                );
                return;
            }
        };

        profile
            .announced_log
            .record(achievement_id, self.settings.announced_log_cap);
        if let Err(err) = self.profiles.save_profile(&profile).await {
            warn!(
                "failed to persist announced log for {}: {}",
                event.subject_key, err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::Duration;

    use crate::notify::notify_model::MessagePayload;
    use crate::notify::notify_traits::SinkError;
    use crate::store::memory::MemoryStore;

    /// Records deliveries; optionally fails every call.
    struct RecordingSink {
        deliveries: StdMutex<Vec<(String, MessagePayload)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                deliveries: StdMutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                deliveries: StdMutex::new(Vec::new()),
                fail: true,
            }
        }

        fn delivered(&self) -> Vec<(String, MessagePayload)> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(
            &self,
            destination: &str,
            payload: &MessagePayload,
        ) -> Result<(), SinkError> {
            self.deliveries
                .lock()
                .unwrap()
                .push((destination.to_string(), payload.clone()));
            if self.fail {
                Err(SinkError::Delivery("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn dispatcher(
        sink: Arc<RecordingSink>,
        store: Arc<MemoryStore>,
        routes: RouteTable,
    ) -> NotificationDispatcher<RecordingSink, MemoryStore> {
        NotificationDispatcher::new(sink, store, routes, TrackerSettings::default())
    }

    fn rank_event(entity_id: &str, subject: &str, observed_at: DateTime<Utc>) -> TransitionEvent {
        TransitionEvent::rank_change(
            TransitionKind::RankImproved,
            entity_id,
            subject,
            Some(4),
            Some(2),
        )
        .observed(observed_at)
    }

    #[tokio::test]
    async fn test_event_fans_out_to_all_routed_destinations() {
        let sink = Arc::new(RecordingSink::new());
        let store = Arc::new(MemoryStore::new());
        let mut routes = RouteTable::new();
        routes
            .add_route(TransitionKind::RankImproved, "general")
            .add_route(TransitionKind::RankImproved, "rankings");

        let dispatcher = dispatcher(sink.clone(), store, routes);
        dispatcher
            .dispatch(&rank_event("board-1", "alice", Utc::now()))
            .await;

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].0, "general");
        assert_eq!(delivered[1].0, "rankings");
    }

    #[tokio::test]
    async fn test_unrouted_kind_is_dropped_loudly() {
        let sink = Arc::new(RecordingSink::new());
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(sink.clone(), store, RouteTable::new());

        dispatcher
            .dispatch(&rank_event("board-1", "alice", Utc::now()))
            .await;
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_per_entity_throttle_drops_within_interval() {
        let sink = Arc::new(RecordingSink::new());
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(sink.clone(), store, RouteTable::all_to("general"));

        let t0 = Utc::now();
        dispatcher.dispatch(&rank_event("board-1", "alice", t0)).await;
        // Ten minutes later: inside the default 30 minute window.
        dispatcher
            .dispatch(&rank_event("board-1", "bob", t0 + Duration::minutes(10)))
            .await;
        // Other entities are unaffected.
        dispatcher
            .dispatch(&rank_event("board-2", "carol", t0 + Duration::minutes(10)))
            .await;
        // Past the window the entity may alert again.
        dispatcher
            .dispatch(&rank_event("board-1", "dave", t0 + Duration::minutes(31)))
            .await;

        let subjects: Vec<String> = sink
            .delivered()
            .iter()
            .map(|(_, p)| p.title.clone())
            .collect();
        assert_eq!(subjects.len(), 3);
        assert!(subjects[0].starts_with("alice"));
        assert!(subjects[1].starts_with("carol"));
        assert!(subjects[2].starts_with("dave"));
    }

    #[tokio::test]
    async fn test_duplicate_achievement_is_dropped_silently() {
        let sink = Arc::new(RecordingSink::new());
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(sink.clone(), store.clone(), RouteTable::all_to("general"));

        let t0 = Utc::now();
        let first = TransitionEvent::achievement_earned("monthly", "alice", 101).observed(t0);
        // Replayed next cycle, outside the throttle window.
        let replay = TransitionEvent::achievement_earned("monthly", "alice", 101)
            .observed(t0 + Duration::hours(1));

        dispatcher.dispatch(&first).await;
        dispatcher.dispatch(&replay).await;

        assert_eq!(sink.delivered().len(), 1);
        let profile = store.load_profile("alice").await.unwrap().unwrap();
        assert!(profile.announced_log.contains(101));
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_roll_back_state() {
        let sink = Arc::new(RecordingSink::failing());
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(sink.clone(), store.clone(), RouteTable::all_to("general"));

        let t0 = Utc::now();
        let event = TransitionEvent::achievement_earned("monthly", "alice", 101).observed(t0);
        dispatcher.dispatch(&event).await;

        // The hand-off happened and failed, but the id stays announced and
        // the entity stays throttled.
        let profile = store.load_profile("alice").await.unwrap().unwrap();
        assert!(profile.announced_log.contains(101));

        let next = TransitionEvent::achievement_earned("monthly", "bob", 202)
            .observed(t0 + Duration::minutes(5));
        dispatcher.dispatch(&next).await;
        assert_eq!(sink.delivered().len(), 1);
    }
}
