//! Client stack for the external achievement API: defensive response
//! decoding, a strict request budget with retry, TTL response caches, and a
//! caching service facade behind the [`AchievementSource`] seam.

pub mod cache;
pub mod client;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod service;
pub mod traits;

pub use cache::{ResponseCache, ResponseCacheStats};
pub use client::AchievementApiClient;
pub use errors::{ApiError, RetryClass};
pub use gateway::RequestBudget;
pub use models::{GameProgress, RankedEntry};
pub use service::AchievementService;
pub use traits::AchievementSource;
