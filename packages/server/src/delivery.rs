//! Telegram delivery-channel adapter.

use async_trait::async_trait;
use thiserror::Error;

use aggregation::error::{PipelineError, Result};
use aggregation::traits::DeliveryChannel;
use aggregation::types::UserId;
use telegram::TelegramService;

/// Send failure reported by the Telegram client.
#[derive(Debug, Error)]
#[error("{0}")]
struct TelegramSendError(&'static str);

/// Bridges the pipeline's delivery contract onto the Bot API client.
pub struct TelegramChannel {
    service: TelegramService,
}

impl TelegramChannel {
    pub fn new(service: TelegramService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn send(&self, recipient: UserId, text: &str) -> Result<()> {
        self.service
            .send_message(recipient, text)
            .await
            .map(|_| ())
            .map_err(|reason| PipelineError::delivery(TelegramSendError(reason)))
    }
}
