//! Snapshot-diff engine: per-entity rank diffing and per-subject award
//! tracking, both feeding transition events to the dispatcher.

pub mod award_tracker;
pub mod diff_engine;
pub mod snapshot_store;
pub mod tracking_model;

pub use award_tracker::AwardTracker;
pub use diff_engine::DiffEngine;
pub use snapshot_store::SnapshotStore;
pub use tracking_model::{
    EntitySnapshot, RosterMember, SnapshotEntry, TrackedEntity, TransitionEvent, TransitionKind,
};
