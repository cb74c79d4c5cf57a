use async_trait::async_trait;

use crate::api::errors::ApiError;
use crate::api::models::{GameProgress, RankedEntry};

/// Read seam over the achievement API for the diff engine and award tracker.
///
/// The production implementation is [`AchievementService`](crate::api::AchievementService);
/// tests substitute scripted fakes.
#[async_trait]
pub trait AchievementSource: Send + Sync {
    /// Full ranked listing for a board, served from cache when fresh.
    async fn leaderboard(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError>;

    /// Full ranked listing for a board, always fetched from upstream.
    /// Used by the re-confirmation pass, which needs two independent reads.
    async fn leaderboard_fresh(&self, board_id: &str) -> Result<Vec<RankedEntry>, ApiError>;

    /// A subject's progress for one game, served from cache when fresh.
    async fn game_progress(
        &self,
        username: &str,
        game_id: &str,
    ) -> Result<GameProgress, ApiError>;
}
