//! Award tiers and the pure progress classifier.

pub mod awards_model;
pub mod classifier;

pub use awards_model::{AwardProgress, AwardRecord, AwardTier, ChallengeDefinition};
pub use classifier::{classify, earned_ids_in_window, in_challenge_window, period_key};
