use std::time::Duration;

use async_trait::async_trait;

use crate::{Result, SessionRecord};

/// Persistent per-user session storage with expiry.
///
/// Stores are not required to serialize callers: two concurrent
/// [`create`](SessionStore::create) calls for one user are allowed and the
/// last write wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live session for `user_id`, or `None` if absent or expired.
    async fn load(&self, user_id: &str) -> Result<Option<SessionRecord>>;

    /// Overwrite the session, restarting its expiry window.
    async fn save(&self, record: &SessionRecord, expiry: Duration) -> Result<()>;

    /// Delete the session. Clearing an absent session is not an error.
    async fn clear(&self, user_id: &str) -> Result<()>;

    /// All live sessions, most recently updated first.
    async fn list(&self) -> Result<Vec<SessionRecord>>;

    /// Drop expired sessions and return how many were removed.
    async fn purge_expired(&self) -> Result<u64>;

    /// Create and persist a fresh session in the start state.
    async fn create(&self, user_id: &str, version: u32, expiry: Duration) -> Result<SessionRecord> {
        let record = SessionRecord::new(user_id, version);
        self.save(&record, expiry).await?;
        Ok(record)
    }
}
