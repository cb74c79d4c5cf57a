/// Upstream API budget: one request per pacing interval.
pub const DEFAULT_REQUESTS_PER_INTERVAL: u32 = 1;

/// Pacing interval for the request budget, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1200;

/// Retry attempts for transient API failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed delay between retry attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Cache TTL for slow-moving API data (game progress), in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Cache TTL for volatile leaderboard listings, in seconds.
pub const VOLATILE_CACHE_TTL_SECS: u64 = 90;

/// Size of the "interesting zone" for rank diffing.
pub const DEFAULT_TOP_K: u32 = 3;

/// Relative snapshot-size change beyond which a fetch is treated as unreliable.
pub const DEFAULT_CONSISTENCY_TOLERANCE: f64 = 0.2;

/// Absolute snapshot-size change that is always accepted.
pub const DEFAULT_CONSISTENCY_MIN_SLACK: usize = 1;

/// Delay before the re-confirmation fetch for volatile entities, in milliseconds.
pub const DEFAULT_RECONFIRM_DELAY_MS: u64 = 1500;

/// Minimum subject overlap for two fetches to be considered in agreement.
pub const DEFAULT_RECONFIRM_OVERLAP: f64 = 0.9;

/// Minimum spacing between notifications for the same entity, in seconds.
pub const DEFAULT_MIN_ALERT_INTERVAL_SECS: u64 = 1800;

/// Maximum announced achievement ids retained per subject.
pub const DEFAULT_ANNOUNCED_LOG_CAP: usize = 200;

/// Delay between entities within one poll cycle, in milliseconds.
pub const DEFAULT_INTER_ENTITY_DELAY_MS: u64 = 1000;

/// Page size for paginated leaderboard fetches.
pub const LEADERBOARD_PAGE_SIZE: u32 = 100;

/// Upper bound on leaderboard pages fetched per listing.
pub const MAX_LEADERBOARD_PAGES: u32 = 50;
