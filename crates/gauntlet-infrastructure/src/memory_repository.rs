//! In-memory repository implementations.
//!
//! Used by tests and embedded deployments that do not need durable
//! storage. Atomicity comes from holding the map lock across the whole
//! read-modify-write, which satisfies the per-user isolation contract.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use gauntlet_core::profile::{
    ProfileRepository, SessionRecordRepository, SessionSummary, UserProfile,
};
use gauntlet_core::Result;

/// In-memory ProfileRepository.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn load(&self, user_id: &str) -> Result<UserProfile> {
        let profiles = self.profiles.lock().await;
        Ok(profiles
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        mutate: Box<dyn for<'a> FnOnce(&'a mut UserProfile) + Send>,
    ) -> Result<UserProfile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));
        mutate(profile);
        Ok(profile.clone())
    }
}

/// In-memory SessionRecordRepository.
#[derive(Default)]
pub struct InMemoryRecordRepository {
    records: Mutex<Vec<SessionSummary>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRecordRepository for InMemoryRecordRepository {
    async fn append(&self, summary: &SessionSummary) -> Result<()> {
        let mut records = self.records.lock().await;
        records.push(summary.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let records = self.records.lock().await;
        let mut matching: Vec<SessionSummary> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.completed_at);
        Ok(matching)
    }
}
