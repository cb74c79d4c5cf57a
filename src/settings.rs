use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Tunable policy for the whole tracker.
///
/// Every knob the pipeline consults lives here so hosts and tests can
/// construct the pipeline with explicit policy instead of ambient constants.
/// The defaults match the values observed to work against the upstream API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Requests released per pacing interval across all callers.
    pub requests_per_interval: u32,
    /// Pacing interval in milliseconds.
    pub interval_ms: u64,
    /// Retry attempts for transient API failures.
    pub max_retries: u32,
    /// Fixed delay between retry attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Cache TTL for slow-moving data classes, in seconds.
    pub default_cache_ttl_secs: u64,
    /// Cache TTL for volatile leaderboard data, in seconds.
    pub volatile_cache_ttl_secs: u64,
    /// Rank zone that generates transition events.
    pub top_k: u32,
    /// Relative snapshot-size change beyond which a fetch is unreliable.
    pub consistency_tolerance: f64,
    /// Absolute snapshot-size change that is always accepted.
    pub consistency_min_slack: usize,
    /// Delay before the re-confirmation fetch, in milliseconds.
    pub reconfirm_delay_ms: u64,
    /// Minimum subject overlap for two fetches to agree.
    pub reconfirm_overlap: f64,
    /// Minimum spacing between notifications per entity, in seconds.
    pub min_alert_interval_secs: u64,
    /// Announced achievement ids retained per subject.
    pub announced_log_cap: usize,
    /// Delay between entities within one poll cycle, in milliseconds.
    pub inter_entity_delay_ms: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            requests_per_interval: DEFAULT_REQUESTS_PER_INTERVAL,
            interval_ms: DEFAULT_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            default_cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            volatile_cache_ttl_secs: VOLATILE_CACHE_TTL_SECS,
            top_k: DEFAULT_TOP_K,
            consistency_tolerance: DEFAULT_CONSISTENCY_TOLERANCE,
            consistency_min_slack: DEFAULT_CONSISTENCY_MIN_SLACK,
            reconfirm_delay_ms: DEFAULT_RECONFIRM_DELAY_MS,
            reconfirm_overlap: DEFAULT_RECONFIRM_OVERLAP,
            min_alert_interval_secs: DEFAULT_MIN_ALERT_INTERVAL_SECS,
            announced_log_cap: DEFAULT_ANNOUNCED_LOG_CAP,
            inter_entity_delay_ms: DEFAULT_INTER_ENTITY_DELAY_MS,
        }
    }
}

impl TrackerSettings {
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn default_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.default_cache_ttl_secs)
    }

    pub fn volatile_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.volatile_cache_ttl_secs)
    }

    pub fn reconfirm_delay(&self) -> Duration {
        Duration::from_millis(self.reconfirm_delay_ms)
    }

    pub fn min_alert_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.min_alert_interval_secs as i64)
    }

    pub fn inter_entity_delay(&self) -> Duration {
        Duration::from_millis(self.inter_entity_delay_ms)
    }
}
