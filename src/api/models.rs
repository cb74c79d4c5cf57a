//! Raw API payloads and their normalized forms.
//!
//! Field names vary across endpoints and API versions, so every raw struct
//! accepts the known casings via serde aliases and fills defaults for absent
//! fields. Business logic only ever sees the normalized types.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One row of a leaderboard listing as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLeaderboardEntry {
    #[serde(alias = "User", alias = "UserName", alias = "username", default)]
    pub user: String,

    #[serde(alias = "Rank", default)]
    pub rank: Option<u32>,

    /// Some endpoint versions report the row's rank under a separate key.
    #[serde(alias = "ApiRank", alias = "apiRank", default)]
    pub api_rank: Option<u32>,

    /// Score arrives as a number on some endpoints and a formatted string on
    /// others.
    #[serde(
        alias = "Score",
        alias = "FormattedScore",
        alias = "formattedScore",
        default
    )]
    pub score: Value,
}

impl RawLeaderboardEntry {
    /// Normalize one row; `position` is the 1-based index in the listing,
    /// used when the payload carries no rank at all. Rows without a user
    /// name are dropped.
    pub fn normalize(self, position: u32) -> Option<RankedEntry> {
        let user = self.user.trim();
        if user.is_empty() {
            return None;
        }
        let api_rank = self.rank.or(self.api_rank).unwrap_or(position);
        Some(RankedEntry {
            subject: user.to_string(),
            api_rank,
            score_text: score_to_text(&self.score),
        })
    }
}

fn score_to_text(score: &Value) -> String {
    match score {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalized leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    /// External user name, exactly as the API reports it.
    pub subject: String,
    /// Rank on the full upstream leaderboard.
    pub api_rank: u32,
    pub score_text: String,
}

/// One achievement inside a game-progress payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAchievementProgress {
    #[serde(alias = "ID", alias = "Id", default)]
    pub id: Option<Value>,

    #[serde(alias = "DateEarned", alias = "dateEarned", default)]
    pub date_earned: Option<String>,

    #[serde(alias = "DateEarnedHardcore", alias = "dateEarnedHardcore", default)]
    pub date_earned_hardcore: Option<String>,
}

/// Per-subject game progress as the API returns it. Achievements arrive as a
/// map keyed by achievement id, with the id usually repeated inside the row.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawGameProgress {
    #[serde(alias = "Achievements", default)]
    pub achievements: HashMap<String, RawAchievementProgress>,

    #[serde(alias = "NumAchievements", alias = "numAchievements", default)]
    pub num_achievements: Option<u32>,
}

impl RawGameProgress {
    /// Normalize to a typed progress record. Rows whose id or timestamp
    /// cannot be decoded are skipped rather than failing the whole payload.
    pub fn normalize(self) -> GameProgress {
        let mut earned = HashMap::new();
        for (key, row) in &self.achievements {
            let Some(id) = achievement_id(key, row) else {
                continue;
            };
            let raw_date = row
                .date_earned_hardcore
                .as_deref()
                .or(row.date_earned.as_deref());
            if let Some(earned_at) = raw_date.and_then(parse_earned_at) {
                earned.insert(id, earned_at);
            }
        }
        GameProgress {
            total: self.num_achievements.unwrap_or(self.achievements.len() as u32) as usize,
            earned,
        }
    }
}

fn achievement_id(key: &str, row: &RawAchievementProgress) -> Option<u64> {
    match &row.id {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => key.parse().ok(),
    }
}

fn parse_earned_at(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Normalized per-subject game progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameProgress {
    /// Achievement id to earned timestamp, for earned achievements only.
    pub earned: HashMap<u64, DateTime<Utc>>,
    /// Total achievements the game defines.
    pub total: usize,
}

impl GameProgress {
    pub fn earned_ids(&self) -> HashSet<u64> {
        self.earned.keys().copied().collect()
    }
}

/// Listings arrive either as a bare array or wrapped in an envelope object
/// whose key differs by endpoint version. Unwraps both shapes.
pub fn listing_rows(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(rows) => Some(rows),
        Value::Object(mut map) => ["Results", "results", "Entries", "entries"]
            .iter()
            .find_map(|key| map.remove(*key))
            .and_then(|inner| match inner {
                Value::Array(rows) => Some(rows),
                _ => None,
            }),
        _ => None,
    }
}
