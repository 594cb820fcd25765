//! Process-local session store.

use std::time::{Duration, Instant};

use {async_trait::async_trait, dashmap::DashMap, tracing::debug};

use crate::{Result, SessionRecord, SessionStore};

struct Entry {
    record: SessionRecord,
    /// `None` when the expiry lies beyond what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Sessions held in a `DashMap` with a per-entry deadline.
///
/// Expired entries are dropped when touched by [`load`](SessionStore::load)
/// or by [`purge_expired`](SessionStore::purge_expired).
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Entry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<SessionRecord>> {
        let now = Instant::now();
        if self
            .sessions
            .remove_if(user_id, |_, entry| entry.is_expired(now))
            .is_some()
        {
            debug!(user_id, "session expired");
            return Ok(None);
        }
        Ok(self.sessions.get(user_id).map(|e| e.record.clone()))
    }

    async fn save(&self, record: &SessionRecord, expiry: Duration) -> Result<()> {
        let expires_at = Instant::now().checked_add(expiry);
        self.sessions.insert(record.user_id.clone(), Entry {
            record: record.clone(),
            expires_at,
        });
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.sessions.remove(user_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>> {
        let now = Instant::now();
        let mut records: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|e| !e.is_expired(now))
            .map(|e| e.record.clone())
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::SessionState};

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn create_then_load() {
        let store = MemorySessionStore::new();
        let created = store.create("u1", 2, HOUR).await.unwrap();

        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.state, SessionState::Start);
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites() {
        let store = MemorySessionStore::new();
        let mut record = store.create("u1", 1, HOUR).await.unwrap();
        record.advance(SessionState::Selected {
            active_endpoint: "news".into(),
        });
        store.save(&record, HOUR).await.unwrap();

        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.state.active_endpoint(), Some("news"));
    }

    #[tokio::test]
    async fn expired_session_is_absent_and_dropped() {
        let store = MemorySessionStore::new();
        store.create("u1", 1, Duration::ZERO).await.unwrap();

        assert!(store.load("u1").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = MemorySessionStore::new();
        store.create("u1", 1, HOUR).await.unwrap();
        store.clear("u1").await.unwrap();
        store.clear("u1").await.unwrap();
        assert!(store.load("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_and_list_skip_expired() {
        let store = MemorySessionStore::new();
        store.create("live", 1, HOUR).await.unwrap();
        store.create("dead-1", 1, Duration::ZERO).await.unwrap();
        store.create("dead-2", 1, Duration::ZERO).await.unwrap();

        let live = store.list().await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].user_id, "live");

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unrepresentable_expiry_never_expires() {
        let store = MemorySessionStore::new();
        store
            .create("u1", 1, Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert!(store.load("u1").await.unwrap().is_some());
        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
