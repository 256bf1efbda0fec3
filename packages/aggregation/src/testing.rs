//! Testing utilities including mock implementations.
//!
//! These let applications and the crate's own tests exercise the pipeline
//! without network calls or a database: a canned vacancy source, a recording
//! delivery channel, and failure-injecting store wrappers.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use thiserror::Error;

use crate::error::{PipelineError, Result};
use crate::stores::MemoryStore;
use crate::traits::{DeliveryChannel, PostingStore, UserStore, VacancySource};
use crate::types::{Criteria, Posting, UserId};

/// Record of one `fetch` call made to a [`MockSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub keywords: Vec<String>,
    pub location: String,
    pub page_limit: usize,
}

/// A vacancy source serving canned postings.
///
/// Postings can be registered per location or as a default for any call;
/// a location with no registered postings yields an empty result, which is
/// also how a timed-out fetch looks to the scheduler.
#[derive(Default)]
pub struct MockSource {
    by_location: RwLock<HashMap<String, Vec<Posting>>>,
    default_postings: RwLock<Vec<Posting>>,
    calls: RwLock<Vec<FetchCall>>,
    delay: std::time::Duration,
    tag: String,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            tag: "mock".to_string(),
            ..Default::default()
        }
    }

    /// Serve these postings for every fetch, regardless of location.
    pub fn with_postings(self, postings: Vec<Posting>) -> Self {
        *self.default_postings.write().unwrap() = postings;
        self
    }

    /// Serve these postings for fetches at one location only.
    pub fn with_postings_for(self, location: impl Into<String>, postings: Vec<Posting>) -> Self {
        self.by_location.write().unwrap().insert(location.into(), postings);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Make every fetch take this long (for overlap/coalescing tests).
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    /// All calls made to this source.
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl VacancySource for MockSource {
    async fn fetch(&self, keywords: &[String], location: &str, page_limit: usize) -> Vec<Posting> {
        self.calls.write().unwrap().push(FetchCall {
            keywords: keywords.to_vec(),
            location: location.to_string(),
            page_limit,
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(postings) = self.by_location.read().unwrap().get(location) {
            return postings.clone();
        }
        self.default_postings.read().unwrap().clone()
    }

    fn source_tag(&self) -> &str {
        &self.tag
    }
}

/// The recipient has blocked the bot (or the chat is gone).
#[derive(Debug, Error)]
#[error("recipient blocked the channel")]
pub struct RecipientBlocked;

/// A transient send failure.
#[derive(Debug, Error)]
#[error("transient send failure")]
pub struct SendFailed;

/// A delivery channel that records sends and can simulate failures.
#[derive(Default)]
pub struct MockChannel {
    sent: RwLock<Vec<(UserId, String)>>,
    blocked: RwLock<HashSet<UserId>>,
    fail_once: RwLock<HashSet<UserId>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to this recipient fails (blocked bot).
    pub fn blocked(self, user_id: UserId) -> Self {
        self.blocked.write().unwrap().insert(user_id);
        self
    }

    /// The next send to this recipient fails; later sends succeed.
    pub fn fail_once_for(self, user_id: UserId) -> Self {
        self.fail_once.write().unwrap().insert(user_id);
        self
    }

    /// All successfully delivered messages, in send order.
    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.read().unwrap().clone()
    }

    /// Messages delivered to one recipient.
    pub fn sent_to(&self, user_id: UserId) -> Vec<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .filter(|(recipient, _)| *recipient == user_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    async fn send(&self, recipient: UserId, text: &str) -> Result<()> {
        if self.blocked.read().unwrap().contains(&recipient) {
            return Err(PipelineError::delivery(RecipientBlocked));
        }
        if self.fail_once.write().unwrap().remove(&recipient) {
            return Err(PipelineError::delivery(SendFailed));
        }
        self.sent.write().unwrap().push((recipient, text.to_string()));
        Ok(())
    }
}

/// The backing store is unreachable.
#[derive(Debug, Error)]
#[error("store unavailable")]
pub struct StoreUnavailable;

/// A user store wrapper that injects failures into selected operations,
/// delegating everything else to an inner [`MemoryStore`].
pub struct FailingUserStore {
    inner: MemoryStore,
    fail_enumeration: RwLock<bool>,
    fail_filter_for: RwLock<HashSet<UserId>>,
}

impl FailingUserStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_enumeration: RwLock::new(false),
            fail_filter_for: RwLock::new(HashSet::new()),
        }
    }

    /// Make `list_active_user_ids` fail (cycle-level failure).
    pub fn fail_enumeration(self) -> Self {
        *self.fail_enumeration.write().unwrap() = true;
        self
    }

    /// Make `get_filter` fail for one user (per-user failure).
    pub fn fail_filter_for(self, user_id: UserId) -> Self {
        self.fail_filter_for.write().unwrap().insert(user_id);
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl UserStore for FailingUserStore {
    async fn list_active_user_ids(&self) -> Result<Vec<UserId>> {
        if *self.fail_enumeration.read().unwrap() {
            return Err(PipelineError::store(StoreUnavailable));
        }
        self.inner.list_active_user_ids().await
    }

    async fn get_filter(&self, user_id: UserId) -> Result<Option<Criteria>> {
        if self.fail_filter_for.read().unwrap().contains(&user_id) {
            return Err(PipelineError::store(StoreUnavailable));
        }
        self.inner.get_filter(user_id).await
    }

    async fn has_been_sent(&self, user_id: UserId, posting_id: &str) -> Result<bool> {
        self.inner.has_been_sent(user_id, posting_id).await
    }

    async fn mark_sent(&self, user_id: UserId, posting_id: &str, title: &str) -> Result<()> {
        self.inner.mark_sent(user_id, posting_id, title).await
    }
}

/// A posting store wrapper that fails inserts for external ids with a given
/// prefix, for group-isolation tests.
pub struct FailingPostingStore {
    inner: MemoryStore,
    fail_prefix: String,
}

impl FailingPostingStore {
    pub fn new(inner: MemoryStore, fail_prefix: impl Into<String>) -> Self {
        Self {
            inner,
            fail_prefix: fail_prefix.into(),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl PostingStore for FailingPostingStore {
    async fn insert_if_absent(&self, posting: &Posting) -> Result<Option<i64>> {
        if posting.external_id.starts_with(&self.fail_prefix) {
            return Err(PipelineError::store(StoreUnavailable));
        }
        self.inner.insert_if_absent(posting).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_source_records_calls_and_serves_by_location() {
        let tashkent = vec![Posting::new("t_1", "A")];
        let source = MockSource::new()
            .with_postings_for("Tashkent", tashkent.clone())
            .with_postings(vec![Posting::new("d_1", "B")]);

        let keywords = vec!["python".to_string()];
        assert_eq!(source.fetch(&keywords, "Tashkent", 1).await, tashkent);
        let elsewhere = source.fetch(&keywords, "Samarkand", 1).await;
        assert_eq!(elsewhere[0].external_id, "d_1");

        assert_eq!(source.call_count(), 2);
        assert_eq!(source.calls()[0].location, "Tashkent");
    }

    #[tokio::test]
    async fn mock_channel_failure_modes() {
        let channel = MockChannel::new().blocked(1).fail_once_for(2);

        assert!(channel.send(1, "x").await.is_err());
        assert!(channel.send(1, "x").await.is_err());

        assert!(channel.send(2, "x").await.is_err());
        assert!(channel.send(2, "x").await.is_ok());

        assert_eq!(channel.sent_to(2).len(), 1);
    }
}
