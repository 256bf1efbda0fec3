//! Grouping scheduler: one scrape-group-filter-deliver cycle.
//!
//! An external timer fires `run_cycle` on a fixed interval. Each cycle
//! partitions active users into groups sharing identical (sorted keywords,
//! primary location) pairs, so one external fetch serves every user with the
//! same search. Fetch fan-out is therefore bounded by the number of distinct
//! searches, not the number of users, and group processing is additionally
//! capped by a semaphore.
//!
//! Overlapping firings coalesce: a `try_lock` on the cycle lock fails while
//! a cycle runs, and the late firing is skipped rather than queued.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};

use crate::distribute::Distributor;
use crate::error::Result;
use crate::traits::{PostingStore, UserStore, VacancySource};
use crate::types::{GroupKey, Posting, UserId};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cap on groups fetching/distributing at the same time.
    pub max_concurrent_groups: usize,

    /// Search result pages fetched per group per cycle.
    pub page_limit: usize,

    /// Location assumed for users who picked none.
    pub fallback_location: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_groups: 5,
            page_limit: 1,
            fallback_location: "Tashkent".to_string(),
        }
    }
}

/// Outcome of one cycle, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The firing overlapped a running cycle and was skipped.
    pub coalesced: bool,

    pub active_users: usize,

    pub groups: usize,

    pub failed_groups: usize,

    /// Postings contributed by global sources this cycle.
    pub global_postings: usize,
}

impl CycleReport {
    fn coalesced() -> Self {
        Self {
            coalesced: true,
            ..Default::default()
        }
    }
}

/// The periodic cycle orchestrator.
///
/// All collaborators are injected; the scheduler owns no I/O of its own
/// beyond what the traits expose.
pub struct Scheduler {
    users: Arc<dyn UserStore>,
    postings: Arc<dyn PostingStore>,
    source: Arc<dyn VacancySource>,
    global_sources: Vec<Arc<dyn VacancySource>>,
    distributor: Distributor,
    config: SchedulerConfig,
    /// Non-reentrant cycle guard; held for the whole cycle.
    cycle_lock: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        users: Arc<dyn UserStore>,
        postings: Arc<dyn PostingStore>,
        source: Arc<dyn VacancySource>,
        distributor: Distributor,
    ) -> Self {
        Self {
            users,
            postings,
            source,
            global_sources: Vec::new(),
            distributor,
            config: SchedulerConfig::default(),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a source fetched once per cycle for all groups (e.g. a channel
    /// feed that is not keyword-searchable).
    pub fn with_global_source(mut self, source: Arc<dyn VacancySource>) -> Self {
        self.global_sources.push(source);
        self
    }

    /// Run one full cycle. Returns `Err` only for cycle-level failures
    /// (user enumeration); everything below that is contained and reported
    /// through the [`CycleReport`].
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            warn!("cycle already in progress, skipping this firing");
            return Ok(CycleReport::coalesced());
        };

        info!("scrape cycle starting");

        let global_postings = self.fetch_global_sources().await;

        let user_ids = self.users.list_active_user_ids().await?;
        info!(active_users = user_ids.len(), "active users enumerated");

        let groups = self.build_groups(&user_ids).await;
        info!(groups = groups.len(), "search groups formed");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_groups));
        let tasks = groups.iter().map(|(key, members)| {
            let semaphore = Arc::clone(&semaphore);
            let global_postings = &global_postings;
            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return false,
                };
                match self.process_group(key, members, global_postings).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(group = %key, error = %e, "group pipeline failed");
                        false
                    }
                }
            }
        });

        let outcomes = join_all(tasks).await;
        let failed_groups = outcomes.iter().filter(|ok| !**ok).count();

        info!(
            groups = groups.len(),
            failed_groups,
            "scrape cycle complete"
        );

        Ok(CycleReport {
            coalesced: false,
            active_users: user_ids.len(),
            groups: groups.len(),
            failed_groups,
            global_postings: global_postings.len(),
        })
    }

    /// Fetch and persist global sources once per cycle. Failures here are
    /// logged and never abort the cycle.
    async fn fetch_global_sources(&self) -> Vec<Posting> {
        let mut all = Vec::new();
        for source in &self.global_sources {
            let postings = source
                .fetch(&[], &self.config.fallback_location, 1)
                .await;
            debug!(
                source = source.source_tag(),
                count = postings.len(),
                "global source fetched"
            );
            for posting in &postings {
                if let Err(e) = self.postings.insert_if_absent(posting).await {
                    warn!(
                        posting_id = %posting.external_id,
                        error = %e,
                        "failed to persist global posting"
                    );
                }
            }
            all.extend(postings);
        }
        all
    }

    /// Partition users into groups by identical search criteria.
    ///
    /// Users without keywords receive nothing this cycle; a user whose
    /// filter fails to load is skipped, not fatal.
    async fn build_groups(&self, user_ids: &[UserId]) -> HashMap<GroupKey, Vec<UserId>> {
        let mut groups: HashMap<GroupKey, Vec<UserId>> = HashMap::new();

        for &user_id in user_ids {
            let criteria = match self.users.get_filter(user_id).await {
                Ok(Some(criteria)) => criteria,
                Ok(None) => continue,
                Err(e) => {
                    warn!(user_id, error = %e, "failed to load filter, skipping user");
                    continue;
                }
            };

            let Some(key) = GroupKey::for_criteria(&criteria, &self.config.fallback_location)
            else {
                continue;
            };
            groups.entry(key).or_default().push(user_id);
        }

        groups
    }

    /// One group's fetch + persist + distribute sequence.
    async fn process_group(
        &self,
        key: &GroupKey,
        members: &[UserId],
        global_postings: &[Posting],
    ) -> Result<()> {
        debug!(group = %key, members = members.len(), "processing group");

        let mut postings = self
            .source
            .fetch(&key.keywords, &key.location, self.config.page_limit)
            .await;

        for posting in &postings {
            // Duplicate external ids come back as Ok(None); a real store
            // error fails the group.
            self.postings.insert_if_absent(posting).await?;
        }

        postings.extend_from_slice(global_postings);
        if postings.is_empty() {
            return Ok(());
        }

        self.distributor.distribute(members, &postings).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribute::DistributorConfig;
    use crate::stores::MemoryStore;
    use crate::testing::{FailingUserStore, MockChannel, MockSource};
    use crate::types::{Criteria, Posting};
    use std::time::Duration;

    fn python_criteria() -> Criteria {
        Criteria::new()
            .with_keywords(["python"])
            .with_locations(["Tashkent"])
    }

    fn posting(id: &str, title: &str) -> Posting {
        Posting::new(id, title)
            .with_location("Tashkent")
            .with_source("mock")
    }

    fn fast_distributor(store: Arc<MemoryStore>, channel: Arc<MockChannel>) -> Distributor {
        Distributor::new(store, channel).with_config(DistributorConfig {
            max_per_user: 3,
            send_delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn users_sharing_criteria_share_one_fetch() {
        let store = Arc::new(MemoryStore::new());
        for user_id in 1..=10 {
            store.add_user(user_id, python_criteria());
        }
        let channel = Arc::new(MockChannel::new());
        let source = Arc::new(
            MockSource::new().with_postings(vec![posting("mock_1", "Python Developer")]),
        );

        let scheduler = Scheduler::new(
            store.clone(),
            store.clone(),
            source.clone(),
            fast_distributor(store.clone(), channel.clone()),
        );

        let report = scheduler.run_cycle().await.unwrap();

        assert!(!report.coalesced);
        assert_eq!(report.active_users, 10);
        assert_eq!(report.groups, 1);
        assert_eq!(source.call_count(), 1);
        assert_eq!(channel.sent().len(), 10);
    }

    #[tokio::test]
    async fn overlapping_firing_is_coalesced() {
        let store = Arc::new(MemoryStore::new());
        store.add_user(1, python_criteria());
        let channel = Arc::new(MockChannel::new());
        let source = Arc::new(
            MockSource::new()
                .with_postings(vec![posting("mock_1", "Python Developer")])
                .with_delay(Duration::from_millis(200)),
        );

        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            store.clone(),
            source.clone(),
            fast_distributor(store.clone(), channel.clone()),
        ));

        let running = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run_cycle().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = scheduler.run_cycle().await.unwrap();
        assert!(second.coalesced);

        let first = running.await.unwrap().unwrap();
        assert!(!first.coalesced);
        // The coalesced firing never fetched.
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn enumeration_failure_aborts_the_cycle() {
        let inner = MemoryStore::new();
        inner.add_user(1, python_criteria());
        let users = Arc::new(FailingUserStore::new(inner).fail_enumeration());
        let postings = Arc::new(MemoryStore::new());
        let channel = Arc::new(MockChannel::new());
        let source = Arc::new(MockSource::new());

        let scheduler = Scheduler::new(
            users.clone(),
            postings,
            source.clone(),
            Distributor::new(users, channel.clone()),
        );

        assert!(scheduler.run_cycle().await.is_err());
        assert_eq!(source.call_count(), 0);
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn filter_load_failure_skips_that_user_only() {
        let inner = MemoryStore::new();
        inner.add_user(1, python_criteria());
        inner.add_user(2, python_criteria());
        let users = Arc::new(FailingUserStore::new(inner).fail_filter_for(1));
        let postings = Arc::new(MemoryStore::new());
        let channel = Arc::new(MockChannel::new());
        let source = Arc::new(
            MockSource::new().with_postings(vec![posting("mock_1", "Python Developer")]),
        );

        let scheduler = Scheduler::new(
            users.clone(),
            postings,
            source,
            Distributor::new(users, channel.clone()).with_config(DistributorConfig {
                max_per_user: 3,
                send_delay: Duration::ZERO,
            }),
        );

        let report = scheduler.run_cycle().await.unwrap();

        // User 1 could not be grouped and drops out of the cycle; user 2
        // still got a delivery.
        assert_eq!(report.groups, 1);
        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 2);
    }

    #[tokio::test]
    async fn users_without_keywords_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.add_user(1, Criteria::new().with_locations(["Tashkent"]));
        store.add_user_without_filter(2);
        store.add_user(3, python_criteria());
        let channel = Arc::new(MockChannel::new());
        let source = Arc::new(
            MockSource::new().with_postings(vec![posting("mock_1", "Python Developer")]),
        );

        let scheduler = Scheduler::new(
            store.clone(),
            store.clone(),
            source.clone(),
            fast_distributor(store.clone(), channel.clone()),
        );

        let report = scheduler.run_cycle().await.unwrap();

        assert_eq!(report.groups, 1);
        assert_eq!(channel.sent().len(), 1);
        assert_eq!(channel.sent()[0].0, 3);
    }

    #[tokio::test]
    async fn global_source_postings_reach_every_group() {
        let store = Arc::new(MemoryStore::new());
        store.add_user(1, python_criteria());
        store.add_user(
            2,
            Criteria::new()
                .with_keywords(["rust"])
                .with_locations(["Samarkand"]),
        );
        let channel = Arc::new(MockChannel::new());
        // Neither location has per-group results.
        let source = Arc::new(MockSource::new());
        // Channel postings carry no structured location, so they pass any
        // location filter.
        let global = Arc::new(
            MockSource::new()
                .with_tag("user_post")
                .with_postings(vec![
                    Posting::new("up_1", "Python and Rust polyglot").with_source("user_post")
                ]),
        );

        let scheduler = Scheduler::new(
            store.clone(),
            store.clone(),
            source,
            fast_distributor(store.clone(), channel.clone()),
        )
        .with_global_source(global.clone());

        let report = scheduler.run_cycle().await.unwrap();

        assert_eq!(report.global_postings, 1);
        // Fetched once per cycle, not once per group.
        assert_eq!(global.call_count(), 1);
        // Both users match it through their own filters.
        assert_eq!(channel.sent().len(), 2);
        assert_eq!(store.posting_count(), 1);
    }
}
