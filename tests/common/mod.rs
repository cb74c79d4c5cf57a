//! Shared fakes for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use questlog_core::api::errors::ApiError;
use questlog_core::api::models::{GameProgress, RankedEntry};
use questlog_core::api::traits::AchievementSource;
use questlog_core::notify::notify_model::MessagePayload;
use questlog_core::notify::notify_traits::{NotificationSink, SinkError};
use questlog_core::tracking::tracking_model::RosterMember;

/// Scripted achievement source; tests swap listings between cycles.
#[derive(Default)]
pub struct FakeAchievementSource {
    listings: Mutex<HashMap<String, Vec<RankedEntry>>>,
    progress: Mutex<HashMap<String, GameProgress>>,
}

impl FakeAchievementSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listing(&self, board_id: &str, listing: Vec<RankedEntry>) {
        self.listings
            .lock()
            .unwrap()
            .insert(board_id.to_string(), listing);
    }

    pub fn set_progress(&self, username: &str, game_id: &str, progress: GameProgress) {
        self.progress
            .lock()
            .unwrap()
            .insert(format!("{}:{}", username, game_id), progress);
    }
}

#[async_trait]
impl AchievementSource for FakeAchievementSource {
    async fn leaderboard(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(board_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn leaderboard_fresh(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
        self.leaderboard(board_id).await
    }

    async fn game_progress(
        &self,
        username: &str,
        game_id: &str,
    ) -> Result<GameProgress, ApiError> {
        Ok(self
            .progress
            .lock()
            .unwrap()
            .get(&format!("{}:{}", username, game_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// Captures every delivery the dispatcher hands off.
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<(String, MessagePayload)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(String, MessagePayload)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.delivered().iter().map(|(_, p)| p.title.clone()).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, destination: &str, payload: &MessagePayload) -> Result<(), SinkError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((destination.to_string(), payload.clone()));
        Ok(())
    }
}

pub fn entry(subject: &str, api_rank: u32) -> RankedEntry {
    RankedEntry {
        subject: subject.to_string(),
        api_rank,
        score_text: format!("{}", 100_000 - api_rank),
    }
}

pub fn member(key: &str) -> RosterMember {
    RosterMember {
        subject_key: key.to_string(),
        api_username: key.to_string(),
        notify_target: None,
    }
}
