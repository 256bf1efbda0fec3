//! Distribution engine: deliver one group's result set to its members.
//!
//! Users are processed sequentially (outbound rate limits); each user's
//! criteria are reloaded so mid-cycle settings changes take effect, then the
//! top matches not yet seen are sent and recorded. Failures never cross a
//! user or posting boundary.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::Result;
use crate::filter;
use crate::traits::{DeliveryChannel, UserStore};
use crate::types::{Posting, UserId};

/// Banner prepended to every delivered posting.
const NEW_POSTING_BANNER: &str = "🆕 <b>Yangi vakansiya!</b>";

#[derive(Debug, Clone)]
pub struct DistributorConfig {
    /// Cap on postings delivered to one user in one cycle.
    pub max_per_user: usize,

    /// Pause after each successful send, to respect per-chat rate limits.
    pub send_delay: Duration,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            max_per_user: 3,
            send_delay: Duration::from_millis(300),
        }
    }
}

/// Fans out postings to users with dedupe and failure isolation.
pub struct Distributor {
    users: Arc<dyn UserStore>,
    channel: Arc<dyn DeliveryChannel>,
    config: DistributorConfig,
}

impl Distributor {
    pub fn new(users: Arc<dyn UserStore>, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self {
            users,
            channel,
            config: DistributorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DistributorConfig) -> Self {
        self.config = config;
        self
    }

    /// Deliver the candidate postings to every listed user.
    ///
    /// A failure for one user (criteria load, store access) is logged and
    /// does not abort the remaining users.
    pub async fn distribute(&self, user_ids: &[UserId], postings: &[Posting]) {
        for &user_id in user_ids {
            if let Err(e) = self.distribute_to_user(user_id, postings).await {
                error!(user_id, error = %e, "distribution failed for user");
            }
        }
    }

    async fn distribute_to_user(&self, user_id: UserId, postings: &[Posting]) -> Result<()> {
        // Criteria may have changed since grouping; reload rather than trust
        // the group snapshot.
        let Some(criteria) = self.users.get_filter(user_id).await? else {
            return Ok(());
        };

        let matched = filter::apply_filters(postings, &criteria);
        let mut delivered = 0usize;

        for posting in matched.iter().take(self.config.max_per_user) {
            if self.users.has_been_sent(user_id, &posting.external_id).await? {
                continue;
            }

            let text = format!("{NEW_POSTING_BANNER}\n\n{}", filter::format_message(posting));

            match self.channel.send(user_id, &text).await {
                Ok(()) => {
                    self.users
                        .mark_sent(user_id, &posting.external_id, &posting.title)
                        .await?;
                    delivered += 1;
                    tokio::time::sleep(self.config.send_delay).await;
                }
                Err(e) => {
                    // Blocked bot / dead chat: silent from the user's view,
                    // visible to operators, isolated to this posting.
                    debug!(
                        user_id,
                        posting_id = %posting.external_id,
                        error = %e,
                        "send failed"
                    );
                }
            }
        }

        if delivered > 0 {
            debug!(user_id, delivered, "postings delivered");
        }
        Ok(())
    }
}
