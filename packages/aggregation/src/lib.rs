//! Vacancy Aggregation Pipeline
//!
//! Periodically scrapes job boards, matches postings against per-user search
//! filters, and fans out unseen matches to subscribers. The pipeline is
//! scrape → group → filter → dedupe → deliver:
//!
//! 1. Active users are partitioned into groups sharing identical
//!    (keyword set, primary location) criteria, so one fetch serves the
//!    whole group.
//! 2. Each group's postings are persisted (insert-if-absent) and distributed
//!    to members through their full filter, skipping anything already
//!    delivered.
//!
//! All collaborators are injected through traits: storage ([`UserStore`],
//! [`PostingStore`]), outbound delivery ([`DeliveryChannel`]) and scraping
//! ([`VacancySource`]). The library owns the orchestration; applications own
//! the backends.
//!
//! # Usage
//!
//! ```rust,ignore
//! use aggregation::{Distributor, HhSource, Scheduler};
//!
//! let distributor = Distributor::new(users.clone(), channel);
//! let scheduler = Scheduler::new(users, postings, Arc::new(HhSource::new()), distributor);
//!
//! // Fired by an external timer; overlapping firings coalesce.
//! scheduler.run_cycle().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (stores, delivery, sources)
//! - [`types`] - Domain types (postings, criteria, groups)
//! - [`sources`] - Source implementations (hh.uz scraper)
//! - [`filter`] - Match predicates and message rendering
//! - [`scheduler`] - The periodic cycle orchestrator
//! - [`distribute`] - Per-user delivery with dedupe
//! - [`stores`] - In-memory store for tests and development
//! - [`testing`] - Mock implementations for testing

pub mod distribute;
pub mod error;
pub mod filter;
pub mod scheduler;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FetchError, PipelineError};
pub use traits::{DeliveryChannel, PostingStore, UserStore, VacancySource};
pub use types::{Criteria, ExperienceLevel, GroupKey, Posting, UserId};

pub use distribute::{Distributor, DistributorConfig};
pub use scheduler::{CycleReport, Scheduler, SchedulerConfig};
pub use sources::HhSource;
pub use stores::MemoryStore;
