//! Caching, budget-paced facade over the raw API client.

use async_trait::async_trait;
use log::debug;

use crate::api::cache::ResponseCache;
use crate::api::client::AchievementApiClient;
use crate::api::errors::ApiError;
use crate::api::gateway::RequestBudget;
use crate::api::models::{GameProgress, RankedEntry};
use crate::api::traits::AchievementSource;
use crate::settings::TrackerSettings;

/// The production [`AchievementSource`]: every upstream call goes through
/// the request budget, and successful results are cached per data class.
pub struct AchievementService {
    client: AchievementApiClient,
    budget: RequestBudget,
    cache: ResponseCache,
}

impl AchievementService {
    pub fn new(
        settings: &TrackerSettings,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: AchievementApiClient::new(base_url, api_key)?,
            budget: RequestBudget::from_settings(settings),
            cache: ResponseCache::new(settings),
        })
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn fetch_leaderboard_upstream(
        &self,
        board_id: &str,
    ) -> Result<Vec<RankedEntry>, ApiError> {
        let rows = self
            .budget
            .call(|| self.client.fetch_leaderboard(board_id))
            .await?;
        self.cache
            .leaderboards
            .insert(board_id.to_string(), rows.clone())
            .await;
        Ok(rows)
    }

    fn progress_key(username: &str, game_id: &str) -> String {
        format!("{}:{}", username.to_lowercase(), game_id)
    }
}

#[async_trait]
impl AchievementSource for AchievementService {
    async fn leaderboard(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
        if let Some(hit) = self.cache.leaderboards.get(board_id).await {
            debug!("leaderboard {}: served from cache", board_id);
            return Ok(hit);
        }
        self.fetch_leaderboard_upstream(board_id).await
    }

    async fn leaderboard_fresh(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
        self.fetch_leaderboard_upstream(board_id).await
    }

    async fn game_progress(
        &self,
        username: &str,
        game_id: &str,
    ) -> Result<GameProgress, ApiError> {
        let key = Self::progress_key(username, game_id);
        if let Some(hit) = self.cache.progress.get(&key).await {
            debug!("progress {}: served from cache", key);
            return Ok(hit);
        }

        let progress = self
            .budget
            .call(|| self.client.fetch_game_progress(username, game_id))
            .await?;
        self.cache.progress.insert(key, progress.clone()).await;
        Ok(progress)
    }
}
