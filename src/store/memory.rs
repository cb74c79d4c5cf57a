//! In-memory store for tests and embedded use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::awards::awards_model::ChallengeDefinition;
use crate::store::store_errors::StoreError;
use crate::store::store_model::SubjectProfile;
use crate::store::store_traits::{SubjectProfileRepository, TrackingConfigRepository};
use crate::tracking::tracking_model::{RosterMember, TrackedEntity};

/// Implements both repository traits over plain maps. Reads return stable
/// orderings so poll cycles are reproducible.
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, SubjectProfile>>,
    entities: RwLock<Vec<TrackedEntity>>,
    challenges: RwLock<Vec<ChallengeDefinition>>,
    members: RwLock<Vec<RosterMember>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_entity(&self, entity: TrackedEntity) {
        self.entities.write().await.push(entity);
    }

    pub async fn add_challenge(&self, challenge: ChallengeDefinition) {
        self.challenges.write().await.push(challenge);
    }

    pub async fn add_member(&self, member: RosterMember) {
        self.members.write().await.push(member);
    }

    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait]
impl SubjectProfileRepository for MemoryStore {
    async fn load_profile(&self, subject_key: &str) -> Result<Option<SubjectProfile>, StoreError> {
        Ok(self.profiles.read().await.get(subject_key).cloned())
    }

    async fn save_profile(&self, profile: &SubjectProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(profile.subject_key.clone(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl TrackingConfigRepository for MemoryStore {
    async fn tracked_entities(&self) -> Result<Vec<TrackedEntity>, StoreError> {
        let mut entities = self.entities.read().await.clone();
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        Ok(entities)
    }

    async fn tracked_challenges(&self) -> Result<Vec<ChallengeDefinition>, StoreError> {
        let mut challenges = self.challenges.read().await.clone();
        challenges.sort_by(|a, b| a.challenge_id.cmp(&b.challenge_id));
        Ok(challenges)
    }

    async fn roster(&self) -> Result<Vec<RosterMember>, StoreError> {
        let mut members = self.members.read().await.clone();
        members.sort_by(|a, b| a.subject_key.cmp(&b.subject_key));
        Ok(members)
    }
}
