use async_trait::async_trait;

use crate::awards::awards_model::ChallengeDefinition;
use crate::store::store_errors::StoreError;
use crate::store::store_model::SubjectProfile;
use crate::tracking::tracking_model::{RosterMember, TrackedEntity};

/// Persistence contract for per-subject state (award records and the
/// announced-id log). The tracker read-modify-writes profiles under a
/// single-writer assumption: no two pollers target the same subject.
#[async_trait]
pub trait SubjectProfileRepository: Send + Sync {
    async fn load_profile(&self, subject_key: &str) -> Result<Option<SubjectProfile>, StoreError>;

    async fn save_profile(&self, profile: &SubjectProfile) -> Result<(), StoreError>;

    /// Load a profile, or a fresh one when the subject has no persisted
    /// state yet.
    async fn load_or_default(&self, subject_key: &str) -> Result<SubjectProfile, StoreError> {
        Ok(self
            .load_profile(subject_key)
            .await?
            .unwrap_or_else(|| SubjectProfile::new(subject_key)))
    }
}

/// Read contract for tracking configuration: which entities and challenges
/// exist, and who is on the roster.
#[async_trait]
pub trait TrackingConfigRepository: Send + Sync {
    async fn tracked_entities(&self) -> Result<Vec<TrackedEntity>, StoreError>;

    async fn tracked_challenges(&self) -> Result<Vec<ChallengeDefinition>, StoreError>;

    async fn roster(&self) -> Result<Vec<RosterMember>, StoreError>;
}
