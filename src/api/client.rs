//! Thin HTTP client for the achievement API.
//!
//! The client owns URL building, status mapping, and defensive decoding.
//! It is unaware of budgets and caches; those live a layer up.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::api::models::{listing_rows, GameProgress, RankedEntry, RawGameProgress, RawLeaderboardEntry};
use crate::constants::{LEADERBOARD_PAGE_SIZE, MAX_LEADERBOARD_PAGES};

const REQUEST_TIMEOUT_SECS: u64 = 30;

const LEADERBOARD_ENTRIES_ENDPOINT: &str = "API_GetLeaderboardEntries.php";
const GAME_PROGRESS_ENDPOINT: &str = "API_GetGameInfoAndUserProgress.php";

/// HTTP client for the achievement API.
#[derive(Clone)]
pub struct AchievementApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AchievementApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        let base = format!("{}/{}", self.base_url, endpoint);
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("y", self.api_key.as_str()));

        let url = Url::parse_with_params(&base, &query)
            .map_err(|e| ApiError::Malformed(format!("failed to build URL: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => return Err(ApiError::RateLimited),
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound(endpoint.to_string())),
            s if !s.is_success() => {
                let context = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
                return Err(ApiError::Status {
                    status: s.as_u16(),
                    context,
                });
            }
            _ => {}
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    /// Fetch one page of leaderboard entries.
    pub async fn leaderboard_page(
        &self,
        board_id: &str,
        offset: u32,
        count: u32,
    ) -> Result<Vec<RankedEntry>, ApiError> {
        let offset_s = offset.to_string();
        let count_s = count.to_string();
        let body = self
            .get_json(
                LEADERBOARD_ENTRIES_ENDPOINT,
                &[
                    ("i", board_id),
                    ("o", offset_s.as_str()),
                    ("c", count_s.as_str()),
                ],
            )
            .await?;

        let rows = listing_rows(body)
            .ok_or_else(|| ApiError::Malformed("leaderboard payload is not a listing".to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let raw: RawLeaderboardEntry = serde_json::from_value(row)
                .map_err(|e| ApiError::Malformed(format!("leaderboard row: {}", e)))?;
            let position = offset + index as u32 + 1;
            if let Some(entry) = raw.normalize(position) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Fetch the full ranked listing for a board, paginating until the API
    /// returns a short page.
    pub async fn fetch_leaderboard(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError> {
        let mut all = Vec::new();
        let mut offset = 0;

        for page in 0..MAX_LEADERBOARD_PAGES {
            let entries = self
                .leaderboard_page(board_id, offset, LEADERBOARD_PAGE_SIZE)
                .await?;
            let fetched = entries.len() as u32;
            all.extend(entries);

            if fetched < LEADERBOARD_PAGE_SIZE {
                break;
            }
            offset += LEADERBOARD_PAGE_SIZE;
            debug!(
                "leaderboard {}: fetched page {} ({} rows so far)",
                board_id,
                page + 1,
                all.len()
            );
        }
        Ok(all)
    }

    /// Fetch a subject's progress for one game.
    pub async fn fetch_game_progress(
        &self,
        username: &str,
        game_id: &str,
    ) -> Result<GameProgress, ApiError> {
        let body = self
            .get_json(GAME_PROGRESS_ENDPOINT, &[("g", game_id), ("u", username)])
            .await?;

        let raw: RawGameProgress = serde_json::from_value(body)
            .map_err(|e| ApiError::Malformed(format!("game progress payload: {}", e)))?;
        Ok(raw.normalize())
    }
}
