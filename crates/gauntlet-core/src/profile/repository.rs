//! Memory collaborator contracts.
//!
//! The core never talks to a storage engine directly; it requires only
//! these read/write contracts. Implementations must be at least strongly
//! consistent per user: no lost updates across concurrent sessions for the
//! same user id.

use async_trait::async_trait;

use super::model::{SessionSummary, UserProfile};
use crate::error::Result;

/// An abstract repository for long-term user profiles.
///
/// # Implementation Notes
///
/// `update` is the atomicity boundary. Implementations must apply the
/// closure under a per-user lock (or an equivalent transactional
/// guarantee), since a user can in principle have concurrent sessions.
/// A single global lock is not required; per-user isolation is.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Loads a user's profile, returning a fresh default profile if none
    /// has been stored yet.
    async fn load(&self, user_id: &str) -> Result<UserProfile>;

    /// Persists a profile.
    async fn save(&self, profile: &UserProfile) -> Result<()>;

    /// Atomically applies `mutate` to the stored profile (or a fresh
    /// default) and persists the result, returning the updated profile.
    async fn update(
        &self,
        user_id: &str,
        mutate: Box<dyn for<'a> FnOnce(&'a mut UserProfile) + Send>,
    ) -> Result<UserProfile>;
}

/// An abstract append-only store for completed session summaries.
#[async_trait]
pub trait SessionRecordRepository: Send + Sync {
    /// Appends a session summary record.
    async fn append(&self, summary: &SessionSummary) -> Result<()>;

    /// Lists stored summaries for a user, oldest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SessionSummary>>;
}
