//! Outbound delivery contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::UserId;

/// A channel that can deliver a formatted message to one recipient.
///
/// Failures are per-recipient (blocked bot, invalid chat) and surface as
/// `Err` values; the distribution engine catches and logs them, so an
/// implementation must never panic on a failed send.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, recipient: UserId, text: &str) -> Result<()>;
}
