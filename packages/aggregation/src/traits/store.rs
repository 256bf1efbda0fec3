//! Storage contracts consumed by the pipeline.
//!
//! The pipeline never talks to a database directly; it reads and writes
//! through these two traits:
//! - `UserStore`: active users, filter criteria, per-user delivery records
//! - `PostingStore`: insert-if-absent posting persistence
//!
//! Both delivery records and postings use idempotent conflict-ignoring
//! writes, so concurrent groups can persist overlapping data without
//! coordination.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Criteria, Posting, UserId};

/// User-facing state: who is active, what they search for, what they have
/// already been shown.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users eligible for delivery this cycle.
    async fn list_active_user_ids(&self) -> Result<Vec<UserId>>;

    /// A user's saved filter, or `None` when they have never configured one.
    async fn get_filter(&self, user_id: UserId) -> Result<Option<Criteria>>;

    /// Whether this posting was already delivered to this user.
    async fn has_been_sent(&self, user_id: UserId, posting_id: &str) -> Result<bool>;

    /// Record a delivery. Idempotent: repeating the same
    /// `(user_id, posting_id)` pair is a no-op, not an error.
    async fn mark_sent(&self, user_id: UserId, posting_id: &str, title: &str) -> Result<()>;
}

/// Append-only posting persistence keyed by external identifier.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Store a posting unless one with the same `external_id` exists.
    ///
    /// Returns the storage row id for a fresh insert, `None` for a
    /// duplicate. Duplicates are expected (overlapping group fetches) and
    /// are never errors.
    async fn insert_if_absent(&self, posting: &Posting) -> Result<Option<i64>>;
}
