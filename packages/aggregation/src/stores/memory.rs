//! In-memory store implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::{PostingStore, UserStore};
use crate::types::{Criteria, Posting, UserId};

#[derive(Debug, Clone)]
struct UserRecord {
    active: bool,
    criteria: Option<Criteria>,
}

/// In-memory users, delivery records and postings.
///
/// Useful for tests and local development. Not suitable for production as
/// data is lost on restart.
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
    /// (user, posting external id) -> posting title at send time.
    sent: RwLock<HashMap<(UserId, String), String>>,
    /// external id -> (row id, posting).
    postings: RwLock<HashMap<String, (i64, Posting)>>,
    next_row_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sent: RwLock::new(HashMap::new()),
            postings: RwLock::new(HashMap::new()),
            next_row_id: AtomicI64::new(1),
        }
    }

    /// Register an active user with a saved filter.
    pub fn add_user(&self, user_id: UserId, criteria: Criteria) {
        self.users.write().unwrap().insert(
            user_id,
            UserRecord {
                active: true,
                criteria: Some(criteria),
            },
        );
    }

    /// Register an active user who never configured a filter.
    pub fn add_user_without_filter(&self, user_id: UserId) {
        self.users.write().unwrap().insert(
            user_id,
            UserRecord {
                active: true,
                criteria: None,
            },
        );
    }

    /// Mark a user inactive; they drop out of cycle enumeration.
    pub fn deactivate(&self, user_id: UserId) {
        if let Some(record) = self.users.write().unwrap().get_mut(&user_id) {
            record.active = false;
        }
    }

    /// Seed a delivery record directly (test setup).
    pub fn record_sent(&self, user_id: UserId, posting_id: &str) {
        self.sent
            .write()
            .unwrap()
            .insert((user_id, posting_id.to_string()), String::new());
    }

    pub fn was_sent(&self, user_id: UserId, posting_id: &str) -> bool {
        self.sent
            .read()
            .unwrap()
            .contains_key(&(user_id, posting_id.to_string()))
    }

    pub fn sent_count(&self, user_id: UserId) -> usize {
        self.sent
            .read()
            .unwrap()
            .keys()
            .filter(|(uid, _)| *uid == user_id)
            .count()
    }

    pub fn posting_count(&self) -> usize {
        self.postings.read().unwrap().len()
    }

    pub fn get_posting(&self, external_id: &str) -> Option<Posting> {
        self.postings
            .read()
            .unwrap()
            .get(external_id)
            .map(|(_, posting)| posting.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_active_user_ids(&self) -> Result<Vec<UserId>> {
        let mut ids: Vec<UserId> = self
            .users
            .read()
            .unwrap()
            .iter()
            .filter(|(_, record)| record.active)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn get_filter(&self, user_id: UserId) -> Result<Option<Criteria>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .get(&user_id)
            .and_then(|record| record.criteria.clone()))
    }

    async fn has_been_sent(&self, user_id: UserId, posting_id: &str) -> Result<bool> {
        Ok(self.was_sent(user_id, posting_id))
    }

    async fn mark_sent(&self, user_id: UserId, posting_id: &str, title: &str) -> Result<()> {
        // Idempotent: re-recording an existing pair is a no-op.
        self.sent
            .write()
            .unwrap()
            .entry((user_id, posting_id.to_string()))
            .or_insert_with(|| title.to_string());
        Ok(())
    }
}

#[async_trait]
impl PostingStore for MemoryStore {
    async fn insert_if_absent(&self, posting: &Posting) -> Result<Option<i64>> {
        let mut postings = self.postings.write().unwrap();
        if postings.contains_key(&posting.external_id) {
            return Ok(None);
        }
        let row_id = self.next_row_id.fetch_add(1, Ordering::Relaxed);
        postings.insert(posting.external_id.clone(), (row_id, posting.clone()));
        Ok(Some(row_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_if_absent_is_idempotent() {
        let store = MemoryStore::new();
        let posting = Posting::new("hh_uz_1", "Developer");

        let first = store.insert_if_absent(&posting).await.unwrap();
        let second = store.insert_if_absent(&posting).await.unwrap();

        assert!(first.is_some());
        assert_eq!(second, None);
        assert_eq!(store.posting_count(), 1);
    }

    #[tokio::test]
    async fn mark_sent_then_has_been_sent() {
        let store = MemoryStore::new();

        assert!(!store.has_been_sent(1, "hh_uz_1").await.unwrap());
        store.mark_sent(1, "hh_uz_1", "Developer").await.unwrap();
        assert!(store.has_been_sent(1, "hh_uz_1").await.unwrap());

        // Duplicate record is a no-op.
        store.mark_sent(1, "hh_uz_1", "Developer").await.unwrap();
        assert_eq!(store.sent_count(1), 1);
    }

    #[tokio::test]
    async fn active_user_enumeration_skips_deactivated() {
        let store = MemoryStore::new();
        store.add_user(2, Criteria::new());
        store.add_user(1, Criteria::new());
        store.add_user(3, Criteria::new());
        store.deactivate(2);

        assert_eq!(store.list_active_user_ids().await.unwrap(), vec![1, 3]);
    }

    #[tokio::test]
    async fn get_filter_distinguishes_missing_user_and_missing_filter() {
        let store = MemoryStore::new();
        store.add_user_without_filter(1);

        assert_eq!(store.get_filter(1).await.unwrap(), None);
        assert_eq!(store.get_filter(99).await.unwrap(), None);
    }
}
