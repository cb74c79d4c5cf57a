//! Periodic, single-flight drivers for the diff engine and award tracker.

pub mod cycles;
pub mod poll_scheduler;

pub use cycles::{AwardPollCycle, RankPollCycle};
pub use poll_scheduler::{PollCycle, PollScheduler};
